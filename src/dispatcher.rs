//! Order dispatcher: the feed client's per-update callback. Debounces,
//! detects, sizes, and fires paired legs with partial-fill compensation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::cache::BookCache;
use crate::detector::{self, DetectorConfig};
use crate::domain::ids::{MarketId, TokenId};
use crate::gateway::{Side, TradingGateway};
use crate::registry::Registry;
use crate::risk::RiskLedger;

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchStatsSnapshot {
    pub orders_placed: u64,
    pub orders_failed: u64,
    pub compensations: u64,
}

/// All three counters live behind one lock so a `snapshot()` is a single
/// read and never mixes values from different instants.
#[derive(Debug, Default)]
pub struct DispatchStats {
    counters: Mutex<DispatchStatsSnapshot>,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        *self.counters.lock()
    }

    fn record_placed(&self, n: u64) {
        self.counters.lock().orders_placed += n;
    }

    fn record_failed(&self, n: u64) {
        self.counters.lock().orders_failed += n;
    }

    fn record_compensation(&self) {
        self.counters.lock().compensations += 1;
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub cooldown_s: u64,
    pub max_position_quote: Decimal,
    pub bankroll_quote: Decimal,
    pub per_trade_fraction: Decimal,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown_s: 10,
            max_position_quote: Decimal::new(100, 0),
            bankroll_quote: Decimal::new(10_000, 0),
            per_trade_fraction: Decimal::new(1, 2), // 0.01
        }
    }
}

enum LegOutcome {
    Filled(crate::gateway::OrderResult),
    Blocked,
    Failed(String),
}

/// Owns the cooldown map (single-task, no locking needed) and the shared
/// handles legs are placed through. Installed as the feed client's update
/// callback; `on_token_updated` is synchronous and spawns the actual
/// placement so it never blocks the feed loop.
pub struct Dispatcher {
    registry: Arc<Registry>,
    cache: Arc<BookCache>,
    gateway: Arc<dyn TradingGateway>,
    risk: Arc<RiskLedger>,
    stats: Arc<DispatchStats>,
    detector_config: DetectorConfig,
    dispatch_config: DispatchConfig,
    last_fired: HashMap<MarketId, Instant>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        cache: Arc<BookCache>,
        gateway: Arc<dyn TradingGateway>,
        risk: Arc<RiskLedger>,
        detector_config: DetectorConfig,
        dispatch_config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            gateway,
            risk,
            stats: Arc::new(DispatchStats::default()),
            detector_config,
            dispatch_config,
            last_fired: HashMap::new(),
        }
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// A shared handle to the live counters, for a stats task to read
    /// without routing through the dispatcher.
    pub fn stats_handle(&self) -> Arc<DispatchStats> {
        self.stats.clone()
    }

    /// The feed client's per-update callback. Resolves the market, applies
    /// the cooldown debounce, runs the detector, and if an opportunity
    /// clears, spawns the concurrent dual-leg placement.
    pub fn on_token_updated(&mut self, token_id: &TokenId) {
        let Some(record) = self.registry.get_market(token_id) else {
            return;
        };

        self.evict_stale_cooldowns();

        if let Some(last) = self.last_fired.get(&record.market_id) {
            if last.elapsed() < Duration::from_secs(self.dispatch_config.cooldown_s) {
                return;
            }
        }

        let Some(opportunity) = detector::check_pair(record, &self.cache, &self.detector_config) else {
            return;
        };

        self.last_fired.insert(record.market_id.clone(), Instant::now());

        let leg_size = self
            .dispatch_config
            .max_position_quote
            .min(self.dispatch_config.bankroll_quote * self.dispatch_config.per_trade_fraction);

        info!(
            market = %opportunity.market_id,
            net_spread = %opportunity.net_spread,
            leg_size = %leg_size,
            "arbitrage opportunity detected, dispatching legs"
        );

        let gateway = self.gateway.clone();
        let risk = self.risk.clone();
        let stats = self.stats.clone();
        tokio::spawn(async move {
            dispatch_legs(gateway, risk, stats, opportunity, leg_size).await;
        });
    }

    fn evict_stale_cooldowns(&mut self) {
        let window = Duration::from_secs(self.dispatch_config.cooldown_s);
        self.last_fired.retain(|_, last| last.elapsed() < window);
    }
}

async fn place_leg(
    gateway: Arc<dyn TradingGateway>,
    risk: Arc<RiskLedger>,
    token: TokenId,
    price: Decimal,
    size: Decimal,
) -> LegOutcome {
    if let Err(err) = risk.check(&token, size) {
        warn!(token = %token, error = %err, "risk check blocked leg");
        return LegOutcome::Blocked;
    }
    risk.record(&token, size);

    match gateway.place_limit_order(&token, Side::Buy, price, size).await {
        Ok(result) => LegOutcome::Filled(result),
        Err(err) => {
            risk.release(&token, size);
            warn!(token = %token, error = %err, "leg placement failed");
            LegOutcome::Failed(err.to_string())
        }
    }
}

/// Places both legs concurrently and compensates a lone fill.
async fn dispatch_legs(
    gateway: Arc<dyn TradingGateway>,
    risk: Arc<RiskLedger>,
    stats: Arc<DispatchStats>,
    opportunity: crate::domain::opportunity::Opportunity,
    leg_size: Decimal,
) {
    let (yes_outcome, no_outcome) = tokio::join!(
        place_leg(
            gateway.clone(),
            risk.clone(),
            opportunity.yes_token.clone(),
            opportunity.yes_ask,
            leg_size,
        ),
        place_leg(
            gateway.clone(),
            risk.clone(),
            opportunity.no_token.clone(),
            opportunity.no_ask,
            leg_size,
        ),
    );

    match (yes_outcome, no_outcome) {
        (LegOutcome::Filled(yes), LegOutcome::Filled(no)) => {
            stats.record_placed(2);
            info!(
                yes_order = %yes.order_id,
                no_order = %no.order_id,
                market = %opportunity.market_id,
                "both legs placed"
            );
        }
        (LegOutcome::Filled(filled), other) => {
            compensate(&gateway, &risk, &stats, filled, &opportunity.yes_token, leg_size, &other_label(&other)).await;
        }
        (other, LegOutcome::Filled(filled)) => {
            compensate(&gateway, &risk, &stats, filled, &opportunity.no_token, leg_size, &other_label(&other)).await;
        }
        _ => {
            stats.record_failed(2);
            warn!(market = %opportunity.market_id, "both legs failed, no compensation needed");
        }
    }
}

fn other_label(outcome: &LegOutcome) -> &'static str {
    match outcome {
        LegOutcome::Blocked => "risk-blocked",
        LegOutcome::Failed(_) => "gateway-rejected",
        LegOutcome::Filled(_) => "filled",
    }
}

async fn compensate(
    gateway: &Arc<dyn TradingGateway>,
    risk: &Arc<RiskLedger>,
    stats: &Arc<DispatchStats>,
    filled: crate::gateway::OrderResult,
    filled_token: &TokenId,
    leg_size: Decimal,
    failed_reason: &str,
) {
    stats.record_placed(1);
    stats.record_failed(1);
    warn!(
        filled_order = %filled.order_id,
        reason = failed_reason,
        "one leg failed, cancelling surviving leg to avoid one-sided exposure"
    );

    match gateway.cancel_order(&filled.order_id).await {
        Ok(()) => {
            risk.release(filled_token, leg_size);
            stats.record_compensation();
        }
        Err(err) => {
            warn!(order = %filled.order_id, error = %err, "compensation cancel failed, leg left open");
        }
    }
}
