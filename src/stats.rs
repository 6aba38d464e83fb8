//! Periodic stats snapshot printer.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::BookCache;
use crate::dispatcher::DispatchStats;
use crate::feed::client::FeedStats;

/// A combined read of every counter this process tracks. The feed client's
/// four counters and the dispatcher's three are each taken under their own
/// single lock, so within a source the numbers are mutually consistent at
/// one instant; the two sources are read independently of each other since
/// they're owned by different tasks.
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub messages_received: u64,
    pub snapshots: u64,
    pub deltas: u64,
    pub reconnects: u64,
    pub orders_placed: u64,
    pub orders_failed: u64,
    pub compensations: u64,
    pub tokens_cached: usize,
}

/// Runs forever, printing a combined snapshot at `interval`. Intended to
/// be spawned as its own task alongside the feed client.
pub async fn run(
    feed_stats: Arc<FeedStats>,
    dispatch_stats: Arc<DispatchStats>,
    cache: Arc<BookCache>,
    interval: Duration,
) {
    loop {
        tokio::time::sleep(interval).await;
        let feed = feed_stats.snapshot();
        let dispatch = dispatch_stats.snapshot();
        let snapshot = StatsSnapshot {
            messages_received: feed.messages_received,
            snapshots: feed.snapshots,
            deltas: feed.deltas,
            reconnects: feed.reconnects,
            orders_placed: dispatch.orders_placed,
            orders_failed: dispatch.orders_failed,
            compensations: dispatch.compensations,
            tokens_cached: cache.len(),
        };
        info!(
            messages_received = snapshot.messages_received,
            snapshots = snapshot.snapshots,
            deltas = snapshot.deltas,
            reconnects = snapshot.reconnects,
            orders_placed = snapshot.orders_placed,
            orders_failed = snapshot.orders_failed,
            compensations = snapshot.compensations,
            tokens_cached = snapshot.tokens_cached,
            "stats"
        );
    }
}
