//! Immutable token-to-market registry, built once at startup from the
//! catalog snapshot.

use std::collections::HashMap;

use crate::domain::ids::{MarketId, TokenId};
use crate::domain::market::{build_record, MarketRecord, RawMarket};

/// Bidirectional lookup from any outcome token to its market record and its
/// sibling leg. Built once from a catalog snapshot and never mutated
/// afterward; concurrent readers need no locking.
pub struct Registry {
    token_to_market: HashMap<TokenId, MarketId>,
    markets: HashMap<MarketId, MarketRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            token_to_market: HashMap::new(),
            markets: HashMap::new(),
        }
    }

    /// Build a registry from raw catalog markets. Markets that aren't
    /// binary, or whose token ids can't be resolved in either vendor
    /// encoding, are skipped.
    pub fn from_markets(markets: &[RawMarket]) -> Self {
        let mut registry = Self::new();
        for raw in markets {
            let Some(record) = build_record(raw) else {
                continue;
            };
            registry
                .token_to_market
                .insert(record.yes_token.clone(), record.market_id.clone());
            registry
                .token_to_market
                .insert(record.no_token.clone(), record.market_id.clone());
            registry.markets.insert(record.market_id.clone(), record);
        }
        registry
    }

    pub fn get_market(&self, token_id: &TokenId) -> Option<&MarketRecord> {
        let market_id = self.token_to_market.get(token_id)?;
        self.markets.get(market_id)
    }

    pub fn get_sibling(&self, token_id: &TokenId) -> Option<&TokenId> {
        self.get_market(token_id)?.sibling_of(token_id)
    }

    pub fn all_token_ids(&self) -> Vec<TokenId> {
        self.token_to_market.keys().cloned().collect()
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn raw_market(condition_id: &str, yes_id: &str, no_id: &str) -> RawMarket {
        RawMarket {
            condition_id: condition_id.to_string(),
            question: Some("Q?".to_string()),
            active: true,
            closed: false,
            clob_token_ids: Some(Value::Array(vec![
                Value::String(yes_id.to_string()),
                Value::String(no_id.to_string()),
            ])),
            outcomes: Some(Value::Array(vec![
                Value::String("Yes".to_string()),
                Value::String("No".to_string()),
            ])),
            tokens: vec![],
        }
    }

    #[test]
    fn builds_bidirectional_map_from_markets() {
        let registry = Registry::from_markets(&[raw_market("cond-1", "yes-1", "no-1")]);
        assert_eq!(registry.market_count(), 1);

        let yes = TokenId::from("yes-1");
        let no = TokenId::from("no-1");
        assert_eq!(registry.get_sibling(&yes).unwrap(), &no);
        assert_eq!(registry.get_sibling(&no).unwrap(), &yes);
        assert_eq!(
            registry.get_market(&yes).unwrap().market_id,
            MarketId::from("cond-1")
        );
    }

    #[test]
    fn unresolvable_market_is_skipped() {
        let mut bad = raw_market("cond-2", "yes-2", "no-2");
        bad.clob_token_ids = None;
        bad.outcomes = None;
        let registry = Registry::from_markets(&[bad]);
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_token_returns_none() {
        let registry = Registry::from_markets(&[raw_market("cond-1", "yes-1", "no-1")]);
        assert!(registry.get_market(&TokenId::from("unknown")).is_none());
    }
}
