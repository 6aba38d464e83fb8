//! Layered configuration: compiled-in defaults, optionally overlaid by a
//! TOML file, then overridden by environment variables.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fee_rate: Decimal,
    pub min_net_spread: Decimal,
    pub min_profit_quote: Decimal,
    pub max_position_quote: Decimal,
    pub max_total_exposure_quote: Decimal,
    pub bankroll_quote: Decimal,
    pub per_trade_fraction: Decimal,
    pub cooldown_s: u64,
    pub subscribe_batch_size: usize,
    pub reconnect_delay_s: u64,
    pub dry_run: bool,
    pub catalog_api_url: String,
    pub feed_ws_url: String,
    pub stats_interval_s: u64,
    pub log_level: String,
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::new(2, 2),
            min_net_spread: Decimal::new(2, 2),
            min_profit_quote: Decimal::new(50, 2),
            max_position_quote: Decimal::new(100, 0),
            max_total_exposure_quote: Decimal::new(500, 0),
            bankroll_quote: Decimal::new(10_000, 0),
            per_trade_fraction: Decimal::new(1, 2),
            cooldown_s: 10,
            subscribe_batch_size: 500,
            reconnect_delay_s: 2,
            dry_run: true,
            catalog_api_url: "https://clob.polymarket.com".to_string(),
            feed_ws_url: "wss://ws-subscriptions-clob.polymarket.com/ws/market".to_string(),
            stats_interval_s: 60,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Loads defaults, overlays an optional TOML file, then overlays
    /// environment variables (highest precedence). Validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("failed to parse config: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        macro_rules! override_parsed {
            ($field:ident, $env:literal) => {
                if let Ok(value) = std::env::var($env) {
                    if let Ok(parsed) = value.parse() {
                        self.$field = parsed;
                    }
                }
            };
        }

        override_parsed!(fee_rate, "FEE_RATE");
        override_parsed!(min_net_spread, "MIN_NET_SPREAD");
        override_parsed!(min_profit_quote, "MIN_PROFIT_QUOTE");
        override_parsed!(max_position_quote, "MAX_POSITION_QUOTE");
        override_parsed!(max_total_exposure_quote, "MAX_TOTAL_EXPOSURE_QUOTE");
        override_parsed!(bankroll_quote, "BANKROLL_QUOTE");
        override_parsed!(per_trade_fraction, "PER_TRADE_FRACTION");
        override_parsed!(cooldown_s, "COOLDOWN_S");
        override_parsed!(subscribe_batch_size, "SUBSCRIBE_BATCH_SIZE");
        override_parsed!(reconnect_delay_s, "RECONNECT_DELAY_S");
        override_parsed!(dry_run, "DRY_RUN");
        override_parsed!(catalog_api_url, "CATALOG_API_URL");
        override_parsed!(feed_ws_url, "FEED_WS_URL");
        override_parsed!(stats_interval_s, "STATS_INTERVAL_S");
        override_parsed!(log_level, "LOG_LEVEL");
        override_parsed!(log_format, "LOG_FORMAT");
    }

    fn validate(&self) -> Result<()> {
        if self.catalog_api_url.is_empty() {
            return Err(Error::Config("catalog_api_url cannot be empty".to_string()));
        }
        if self.feed_ws_url.is_empty() {
            return Err(Error::Config("feed_ws_url cannot be empty".to_string()));
        }
        if self.max_position_quote <= Decimal::ZERO {
            return Err(Error::Config("max_position_quote must be positive".to_string()));
        }
        if self.max_total_exposure_quote <= Decimal::ZERO {
            return Err(Error::Config("max_total_exposure_quote must be positive".to_string()));
        }
        if self.subscribe_batch_size == 0 {
            return Err(Error::Config("subscribe_batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_cleanly() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_empty_urls() {
        let mut config = Config::default();
        config.feed_ws_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_caps() {
        let mut config = Config::default();
        config.max_position_quote = Decimal::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_surfaces_as_config_error() {
        let err = Config::from_file(Path::new("/nonexistent/path.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
