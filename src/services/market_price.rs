//! Market-price resolver for lost-book penalties
//!
//! Queries an external listing API for the book's current market price. The
//! lookup is best-effort: any miss (disabled, no listing, malformed payload)
//! resolves to `None` and the caller falls back to manual entry.

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    config::MarketPriceConfig,
    error::{AppError, AppResult},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketPriceResolver: Send + Sync {
    /// Current market price for the given ISBN, in the deployment currency,
    /// or `None` when no listing resolves.
    async fn price_for_isbn(&self, isbn: &str) -> AppResult<Option<Decimal>>;
}

pub struct HttpMarketPriceResolver {
    client: reqwest::Client,
    config: MarketPriceConfig,
}

impl HttpMarketPriceResolver {
    pub fn new(config: MarketPriceConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MarketPriceResolver for HttpMarketPriceResolver {
    async fn price_for_isbn(&self, isbn: &str) -> AppResult<Option<Decimal>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("q", isbn), ("category_ids", "267")])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Market price lookup failed: {}", e)))?;

        if !response.status().is_success() {
            tracing::warn!(
                "Market price lookup for ISBN {} returned {}",
                isbn,
                response.status()
            );
            return Ok(None);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid market price payload: {}", e)))?;

        let rate = Decimal::from_f64(self.config.conversion_rate)
            .ok_or_else(|| AppError::Internal("Invalid conversion rate".to_string()))?;

        Ok(first_listing_price(&body).map(|usd| usd * rate))
    }
}

/// Price of the first listing in a search response, in the listing currency
fn first_listing_price(body: &Value) -> Option<Decimal> {
    body.get("itemSummaries")?
        .as_array()?
        .first()?
        .get("price")?
        .get("value")?
        .as_str()?
        .parse::<Decimal>()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_listing_price() {
        let body = json!({
            "itemSummaries": [
                { "price": { "value": "12.50", "currency": "USD" } },
                { "price": { "value": "99.00", "currency": "USD" } }
            ]
        });
        assert_eq!(first_listing_price(&body), Some("12.50".parse().unwrap()));
    }

    #[test]
    fn missing_listings_resolve_to_none() {
        assert_eq!(first_listing_price(&json!({})), None);
        assert_eq!(first_listing_price(&json!({ "itemSummaries": [] })), None);
        assert_eq!(
            first_listing_price(&json!({ "itemSummaries": [{ "price": {} }] })),
            None
        );
    }

    #[test]
    fn malformed_price_resolves_to_none() {
        let body = json!({
            "itemSummaries": [{ "price": { "value": "not-a-number" } }]
        });
        assert_eq!(first_listing_price(&body), None);
    }
}
