//! External collaborators used by the conversational protocol
//!
//! - [`PricingService`]: applies a real pricing optimization
//! - [`ProductCatalogCache`]: cached product views that must be invalidated
//!   after prices change

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PricingServiceConfig;
use crate::{Error, Result};

/// Cache keys refreshed after a successful optimization
pub const PRICING_CACHE_KEYS: [&str; 2] = ["products", "featured-products"];

/// Result of a pricing optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOutcome {
    pub total_products_updated: u64,
    pub average_increase_percent: f64,
}

#[async_trait]
pub trait PricingService: Send + Sync {
    /// Recalculate and apply prices
    async fn optimize_pricing(&self) -> Result<PricingOutcome>;
}

#[async_trait]
pub trait ProductCatalogCache: Send + Sync {
    /// Mark the given cache keys stale
    async fn invalidate(&self, keys: &[&str]);
}

/// Pricing service reached over HTTP
#[derive(Clone)]
pub struct HttpPricingService {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPricingService {
    pub fn new(config: &PricingServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/agents/pricing/optimize", self.base_url)
    }
}

#[async_trait]
impl PricingService for HttpPricingService {
    async fn optimize_pricing(&self) -> Result<PricingOutcome> {
        let url = self.endpoint();
        debug!(url = %url, "Requesting pricing optimization");

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| Error::PricingUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::PricingUnavailable(format!("{}: {}", status, body)));
        }

        let outcome: PricingOutcome = response.json().await?;
        info!(
            products_updated = outcome.total_products_updated,
            average_increase_percent = outcome.average_increase_percent,
            "Pricing optimization applied"
        );
        Ok(outcome)
    }
}

/// In-process cache tracking a generation counter per key
#[derive(Debug, Default)]
pub struct InMemoryCatalogCache {
    generations: Mutex<HashMap<String, u64>>,
}

impl InMemoryCatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `key` has been invalidated
    pub fn generation(&self, key: &str) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

#[async_trait]
impl ProductCatalogCache for InMemoryCatalogCache {
    async fn invalidate(&self, keys: &[&str]) {
        let mut generations = self.generations.lock().unwrap_or_else(|e| e.into_inner());
        for key in keys {
            *generations.entry(key.to_string()).or_default() += 1;
        }
        debug!(keys = ?keys, "Invalidated catalog cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_cache_counts_invalidations() {
        let cache = InMemoryCatalogCache::new();
        assert_eq!(cache.generation("products"), 0);

        cache.invalidate(&PRICING_CACHE_KEYS).await;
        cache.invalidate(&["products"]).await;

        assert_eq!(cache.generation("products"), 2);
        assert_eq!(cache.generation("featured-products"), 1);
        assert_eq!(cache.generation("categories"), 0);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = PricingServiceConfig {
            base_url: "http://pricing.local:9000/".to_string(),
            ..Default::default()
        };
        let service = HttpPricingService::new(&config).unwrap();
        assert_eq!(
            service.endpoint(),
            "http://pricing.local:9000/api/agents/pricing/optimize"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let config = PricingServiceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            connect_timeout_secs: 1,
        };
        let service = HttpPricingService::new(&config).unwrap();
        let err = service.optimize_pricing().await.unwrap_err();
        assert!(matches!(err, Error::PricingUnavailable(_)));
    }

    #[test]
    fn test_outcome_parses_service_payload() {
        let outcome: PricingOutcome = serde_json::from_str(
            r#"{"total_products_updated": 12, "average_increase_percent": 4.5}"#,
        )
        .unwrap();
        assert_eq!(outcome.total_products_updated, 12);
    }
}
