//! Catalog client: fetches the active-market snapshot used to build the
//! registry at startup.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::market::RawMarket;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn list_active_markets(&self, limit: usize) -> Result<Vec<RawMarket>>;
}

pub struct HttpCatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_active_markets(&self, limit: usize) -> Result<Vec<RawMarket>> {
        let url = format!(
            "{}/markets?active=true&closed=false&limit={}",
            self.base_url, limit
        );
        info!(url = %url, "fetching active markets");

        let response: MarketsResponse = self.client.get(&url).send().await?.json().await?;

        let markets: Vec<RawMarket> = response
            .data
            .into_iter()
            .filter_map(|raw| match serde_json::from_value(raw.clone()) {
                Ok(market) => Some(market),
                Err(err) => {
                    warn!(error = %err, "skipping market that failed to parse");
                    None
                }
            })
            .collect();

        debug!(count = markets.len(), "fetched markets");
        Ok(markets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markets_response_defaults_to_empty_on_missing_data() {
        let parsed: MarketsResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.data.is_empty());
    }
}
