//! Exposure ledger: per-token and aggregate position caps, checked before
//! every order dispatch and released on completion.

use std::collections::HashMap;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::ids::TokenId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RiskError {
    #[error("position limit exceeded for token {token}: {requested} + {current} > {limit}")]
    PositionLimit {
        token: String,
        requested: Decimal,
        current: Decimal,
        limit: Decimal,
    },
    #[error("total exposure limit exceeded: {requested} + {current} > {limit}")]
    ExposureLimit {
        requested: Decimal,
        current: Decimal,
        limit: Decimal,
    },
}

struct LedgerState {
    per_token: HashMap<TokenId, Decimal>,
    total: Decimal,
}

/// Tracks outstanding exposure and enforces the configured caps.
///
/// `check` and `record` are split, not fused, because the dispatcher needs
/// to know whether an order is allowed before it has committed to placing
/// it. Once a leg is confirmed placed, the caller commits the reservation
/// with `record`; if the leg never goes out, nothing was ever reserved.
pub struct RiskLedger {
    state: Mutex<LedgerState>,
    max_position: Decimal,
    max_total: Decimal,
}

impl RiskLedger {
    pub fn new(max_position: Decimal, max_total: Decimal) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                per_token: HashMap::new(),
                total: Decimal::ZERO,
            }),
            max_position,
            max_total,
        }
    }

    /// Returns `Ok(())` if `amount` can be added to `token`'s exposure
    /// without breaching either cap.
    pub fn check(&self, token: &TokenId, amount: Decimal) -> Result<(), RiskError> {
        let state = self.state.lock();
        let current = state.per_token.get(token).copied().unwrap_or(Decimal::ZERO);
        if current + amount > self.max_position {
            return Err(RiskError::PositionLimit {
                token: token.to_string(),
                requested: amount,
                current,
                limit: self.max_position,
            });
        }
        if state.total + amount > self.max_total {
            return Err(RiskError::ExposureLimit {
                requested: amount,
                current: state.total,
                limit: self.max_total,
            });
        }
        Ok(())
    }

    /// Records `amount` against `token`'s exposure and the aggregate total.
    /// Callers should have called `check` first; `record` does not
    /// re-validate the caps.
    pub fn record(&self, token: &TokenId, amount: Decimal) {
        let mut state = self.state.lock();
        *state.per_token.entry(token.clone()).or_insert(Decimal::ZERO) += amount;
        state.total += amount;
    }

    /// Releases previously recorded exposure, e.g. after a position closes
    /// or a compensating cancel succeeds. Clamped to zero so a
    /// double-release can't drive exposure negative.
    pub fn release(&self, token: &TokenId, amount: Decimal) {
        let mut state = self.state.lock();
        if let Some(entry) = state.per_token.get_mut(token) {
            *entry = (*entry - amount).max(Decimal::ZERO);
        }
        state.total = (state.total - amount).max(Decimal::ZERO);
    }

    pub fn total_exposure(&self) -> Decimal {
        self.state.lock().total
    }

    pub fn exposure_for(&self, token: &TokenId) -> Decimal {
        self.state
            .lock()
            .per_token
            .get(token)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> RiskLedger {
        RiskLedger::new(dec!(100), dec!(500))
    }

    #[test]
    fn check_allows_within_caps() {
        let ledger = ledger();
        assert!(ledger.check(&TokenId::from("tok-1"), dec!(50)).is_ok());
    }

    #[test]
    fn check_rejects_position_limit() {
        let ledger = ledger();
        ledger.record(&TokenId::from("tok-1"), dec!(80));
        let err = ledger.check(&TokenId::from("tok-1"), dec!(30)).unwrap_err();
        assert!(matches!(err, RiskError::PositionLimit { .. }));
    }

    #[test]
    fn check_rejects_total_exposure_limit() {
        let ledger = ledger();
        for i in 0..5 {
            ledger.record(&TokenId::from(format!("tok-{i}")), dec!(90));
        }
        let err = ledger.check(&TokenId::from("tok-new"), dec!(90)).unwrap_err();
        assert!(matches!(err, RiskError::ExposureLimit { .. }));
    }

    #[test]
    fn release_reduces_exposure_and_clamps_at_zero() {
        let ledger = ledger();
        let token = TokenId::from("tok-1");
        ledger.record(&token, dec!(40));
        ledger.release(&token, dec!(100));
        assert_eq!(ledger.exposure_for(&token), dec!(0));
        assert_eq!(ledger.total_exposure(), dec!(0));
    }

    #[test]
    fn record_accumulates_across_calls() {
        let ledger = ledger();
        let token = TokenId::from("tok-1");
        ledger.record(&token, dec!(20));
        ledger.record(&token, dec!(30));
        assert_eq!(ledger.exposure_for(&token), dec!(50));
        assert_eq!(ledger.total_exposure(), dec!(50));
    }
}
