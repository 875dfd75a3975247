//! Business logic services

pub mod audit;
pub mod email;
pub mod lending;
pub mod market_price;
pub mod scanner;
pub mod stats;

use std::sync::Arc;

use crate::{
    config::AppConfig,
    error::AppResult,
    lending::{Clock, SystemClock},
    repository::Repository,
};

/// Container for all handler-facing services
#[derive(Clone)]
pub struct Services {
    pub lending: lending::LendingService,
    pub stats: stats::StatsService,
    pub email: email::EmailService,
    pub audit: audit::AuditService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let market_price = Arc::new(market_price::HttpMarketPriceResolver::new(
            config.market_price.clone(),
        )?);
        let audit = audit::AuditService::new(repository.clone());

        Ok(Self {
            lending: lending::LendingService::new(
                repository.clone(),
                audit.clone(),
                market_price,
                clock,
                config.lending.clone(),
            ),
            stats: stats::StatsService::new(repository.clone()),
            email: email::EmailService::new(config.email.clone()),
            audit,
        })
    }
}
