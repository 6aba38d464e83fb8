//! Arbitrage opportunity record, as produced by the detector.

use std::fmt;

use rust_decimal::Decimal;

use crate::domain::ids::{MarketId, TokenId};

/// A detected YES/NO arbitrage opportunity on a single market.
#[derive(Debug, Clone)]
pub struct Opportunity {
    pub market_id: MarketId,
    pub question: String,
    pub yes_token: TokenId,
    pub no_token: TokenId,
    pub yes_ask: Decimal,
    pub no_ask: Decimal,
    pub raw_spread: Decimal,
    pub net_spread: Decimal,
    pub expected_profit_pct: Decimal,
    pub tradable_volume: Decimal,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | yes={} no={} net_spread={} profit%={}",
            self.question, self.yes_ask, self.no_ask, self.net_spread, self.expected_profit_pct
        )
    }
}
