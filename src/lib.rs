//! ShelfMaster Loan & Penalty Lifecycle Server
//!
//! A Rust implementation of the ShelfMaster library lending core: loan
//! issuance and returns, overdue tracking with penalty accrual, and cashier
//! settlement, exposed as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod lending;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
