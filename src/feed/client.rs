//! Feed client: persistent WebSocket connection with a fixed-delay
//! reconnect loop, batched subscriptions, and per-token update dispatch.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::domain::ids::TokenId;
use crate::error::Result;
use crate::feed::messages::{FeedEvent, SubscribeMessage};

/// Read-only snapshot of the feed client's counters, safe to print or
/// export without holding any lock on live state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedStatsSnapshot {
    pub messages_received: u64,
    pub snapshots: u64,
    pub deltas: u64,
    pub reconnects: u64,
}

/// All four counters live behind one lock so a `snapshot()` is a single
/// read and never mixes values from different instants.
#[derive(Debug, Default)]
pub struct FeedStats {
    counters: Mutex<FeedStatsSnapshot>,
}

impl FeedStats {
    pub fn snapshot(&self) -> FeedStatsSnapshot {
        *self.counters.lock()
    }

    fn record_message(&self) {
        self.counters.lock().messages_received += 1;
    }

    fn record_snapshot(&self) {
        self.counters.lock().snapshots += 1;
    }

    fn record_delta(&self) {
        self.counters.lock().deltas += 1;
    }

    fn record_reconnect(&self) {
        self.counters.lock().reconnects += 1;
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ws_url: String,
    pub subscribe_batch_size: usize,
    pub reconnect_delay_s: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://ws-subscriptions-clob.polymarket.com/ws/market".to_string(),
            subscribe_batch_size: 500,
            reconnect_delay_s: 2,
        }
    }
}

/// Persistent market-data feed connection.
///
/// `run` never returns on its own: any connection error or clean server
/// close is logged and followed by a fixed reconnect delay. The caller is
/// expected to drive this inside a cancellable task.
pub struct FeedClient {
    config: FeedConfig,
    stats: std::sync::Arc<FeedStats>,
}

impl FeedClient {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            stats: std::sync::Arc::new(FeedStats::default()),
        }
    }

    pub fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    /// A shared handle to the live counters, for a stats task to read
    /// without routing through the feed loop.
    pub fn stats_handle(&self) -> std::sync::Arc<FeedStats> {
        self.stats.clone()
    }

    /// Runs the reconnect loop, invoking `on_event` for every successfully
    /// parsed feed event after the cache has already been mutated by the
    /// caller-provided handler. `on_event` must be fast: it runs on the
    /// same task that drives the socket.
    pub async fn run<F>(&self, token_ids: &[TokenId], mut on_event: F)
    where
        F: FnMut(FeedEvent),
    {
        let mut first = true;
        loop {
            if !first {
                self.stats.record_reconnect();
                info!(delay_s = self.config.reconnect_delay_s, "reconnecting");
                sleep(Duration::from_secs(self.config.reconnect_delay_s)).await;
            }
            first = false;

            if let Err(err) = self.connect_and_listen(token_ids, &mut on_event).await {
                warn!(error = %err, "feed connection ended with error");
            }
        }
    }

    async fn connect_and_listen<F>(&self, token_ids: &[TokenId], on_event: &mut F) -> Result<()>
    where
        F: FnMut(FeedEvent),
    {
        info!(url = %self.config.ws_url, "connecting to feed");
        let (mut ws, response) = tokio_tungstenite::connect_async(&self.config.ws_url).await?;
        info!(status = %response.status(), "feed connected");

        for batch in token_ids.chunks(self.config.subscribe_batch_size.max(1)) {
            let ids: Vec<String> = batch.iter().map(|t| t.as_str().to_string()).collect();
            let msg = SubscribeMessage::new(ids);
            let json = serde_json::to_string(&msg)?;
            ws.send(Message::Text(json)).await?;
        }
        info!(tokens = token_ids.len(), "subscriptions sent");

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    self.stats.record_message();
                    self.dispatch_frame(&text, on_event);
                }
                Ok(Message::Ping(payload)) => {
                    debug!("received ping");
                    ws.send(Message::Pong(payload)).await?;
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "feed closed by server");
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, "feed transport error");
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    /// A frame is either a single event object or a JSON array of them.
    fn dispatch_frame<F>(&self, text: &str, on_event: &mut F)
    where
        F: FnMut(FeedEvent),
    {
        let value: serde_json::Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, "malformed feed frame, dropping");
                return;
            }
        };

        let events: Vec<serde_json::Value> = match value {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };

        for raw in events {
            match serde_json::from_value::<FeedEvent>(raw) {
                Ok(FeedEvent::Book(book)) => {
                    self.stats.record_snapshot();
                    on_event(FeedEvent::Book(book));
                }
                Ok(FeedEvent::PriceChange(change)) => {
                    self.stats.record_delta();
                    on_event(FeedEvent::PriceChange(change));
                }
                Ok(FeedEvent::TickSizeChange(_)) | Ok(FeedEvent::Unknown) => {}
                Err(err) => {
                    warn!(error = %err, "failed to parse feed event, dropping");
                }
            }
        }
    }
}
