//! Fee-adjusted arbitrage detection over a YES/NO token pair.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::cache::BookCache;
use crate::domain::market::MarketRecord;
use crate::domain::opportunity::Opportunity;

/// Thresholds the detector checks a candidate pair against. Deserializable
/// so it can live in the layered configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Taker fee charged on each leg, applied to the sum of both asks.
    pub fee_rate: Decimal,
    /// Minimum fee-adjusted spread required to consider a pair tradable.
    pub min_net_spread: Decimal,
    /// Minimum expected profit, in quote currency, at the tradable volume.
    pub min_profit: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fee_rate: Decimal::new(2, 2),   // 0.02
            min_net_spread: Decimal::new(2, 2), // 0.02
            min_profit: Decimal::new(50, 2),   // 0.50
        }
    }
}

/// Checks a single market pair against the current book cache and returns
/// an [`Opportunity`] if the fee-adjusted spread clears both thresholds.
///
/// `raw_spread = 1 - yes_ask - no_ask`: what's left over if both legs
/// resolve together. `fee_cost` assumes the taker fee is charged on both
/// asks. The net of the two is compared against `min_net_spread`; if it
/// clears, profit is projected at the volume available on the thinner leg
/// and compared against `min_profit`.
pub fn check_pair(record: &MarketRecord, cache: &BookCache, config: &DetectorConfig) -> Option<Opportunity> {
    let (yes_book, no_book) = cache.get_pair(&record.yes_token, &record.no_token);
    let (yes_ask, yes_size) = yes_book?.best_ask?;
    let (no_ask, no_size) = no_book?.best_ask?;

    let raw_spread = Decimal::ONE - yes_ask - no_ask;
    if raw_spread <= Decimal::ZERO {
        return None;
    }

    let fee_cost = config.fee_rate * (yes_ask + no_ask);
    let net_spread = raw_spread - fee_cost;
    if net_spread < config.min_net_spread {
        return None;
    }

    let volume = yes_size.min(no_size);
    let expected_profit = net_spread * volume;
    if expected_profit < config.min_profit {
        return None;
    }

    let denominator = yes_ask + no_ask + fee_cost;
    let expected_profit_pct = if denominator.is_zero() {
        Decimal::ZERO
    } else {
        (net_spread / denominator) * Decimal::from(100)
    };

    Some(Opportunity {
        market_id: record.market_id.clone(),
        question: record.question.clone(),
        yes_token: record.yes_token.clone(),
        no_token: record.no_token.clone(),
        yes_ask,
        no_ask,
        raw_spread,
        net_spread,
        expected_profit_pct,
        tradable_volume: volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{MarketId, TokenId};
    use crate::feed::messages::BookMessage;
    use crate::domain::book::WireLevel;
    use rust_decimal_macros::dec;

    fn record() -> MarketRecord {
        MarketRecord {
            market_id: MarketId::from("cond-1"),
            question: "Will it happen?".to_string(),
            yes_token: TokenId::from("yes-1"),
            no_token: TokenId::from("no-1"),
        }
    }

    fn level(price: &str, size: &str) -> WireLevel {
        WireLevel {
            price: price.to_string(),
            size: size.to_string(),
        }
    }

    fn seed(cache: &BookCache, asset_id: &str, ask_price: &str, ask_size: &str) {
        cache.apply_snapshot(&BookMessage {
            asset_id: asset_id.to_string(),
            market: None,
            bids: vec![],
            asks: vec![level(ask_price, ask_size)],
            timestamp: None,
            hash: None,
        });
    }

    fn config() -> DetectorConfig {
        DetectorConfig {
            fee_rate: dec!(0.02),
            min_net_spread: dec!(0.02),
            min_profit: dec!(0.50),
        }
    }

    #[test]
    fn detects_arbitrage_when_net_spread_clears_threshold() {
        let cache = BookCache::new();
        seed(&cache, "yes-1", "0.40", "100");
        seed(&cache, "no-1", "0.50", "100");

        let opp = check_pair(&record(), &cache, &config()).unwrap();
        assert_eq!(opp.raw_spread, dec!(0.10));
        // fee_cost = 0.02 * 0.90 = 0.018, net_spread = 0.082
        assert_eq!(opp.net_spread, dec!(0.082));
        assert_eq!(opp.tradable_volume, dec!(100));
    }

    #[test]
    fn no_arbitrage_at_parity() {
        let cache = BookCache::new();
        seed(&cache, "yes-1", "0.50", "100");
        seed(&cache, "no-1", "0.50", "100");
        assert!(check_pair(&record(), &cache, &config()).is_none());
    }

    #[test]
    fn rejects_when_net_spread_below_minimum() {
        let cache = BookCache::new();
        // raw_spread 0.02, fee_cost ~0.0196, net ~0.0004 -- below 0.02 minimum
        seed(&cache, "yes-1", "0.49", "100");
        seed(&cache, "no-1", "0.49", "100");
        assert!(check_pair(&record(), &cache, &config()).is_none());
    }

    #[test]
    fn rejects_when_projected_profit_below_minimum() {
        let cache = BookCache::new();
        // net_spread clears, but volume of 1 yields profit far below 0.50
        seed(&cache, "yes-1", "0.40", "1");
        seed(&cache, "no-1", "0.50", "1");
        assert!(check_pair(&record(), &cache, &config()).is_none());
    }

    #[test]
    fn volume_limited_by_thinner_leg() {
        let cache = BookCache::new();
        seed(&cache, "yes-1", "0.40", "50");
        seed(&cache, "no-1", "0.50", "1000");
        let opp = check_pair(&record(), &cache, &config()).unwrap();
        assert_eq!(opp.tradable_volume, dec!(50));
    }

    #[test]
    fn missing_book_yields_no_opportunity() {
        let cache = BookCache::new();
        seed(&cache, "yes-1", "0.40", "100");
        assert!(check_pair(&record(), &cache, &config()).is_none());
    }
}
