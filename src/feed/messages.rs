//! Wire types for the market-data feed: subscription requests and the
//! event envelope emitted by the exchange.

use serde::{Deserialize, Serialize};

use crate::domain::book::WireLevel;

/// Subscription request, sent in batches after connecting.
#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
    pub custom_feature_enabled: bool,
}

impl SubscribeMessage {
    pub fn new(asset_ids: Vec<String>) -> Self {
        Self {
            assets_ids: asset_ids,
            msg_type: "market".to_string(),
            custom_feature_enabled: true,
        }
    }
}

/// A single incoming feed event, tagged on `event_type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "event_type")]
pub enum FeedEvent {
    #[serde(rename = "book")]
    Book(BookMessage),

    #[serde(rename = "price_change")]
    PriceChange(PriceChangeMessage),

    #[serde(rename = "tick_size_change")]
    TickSizeChange(serde_json::Value),

    #[serde(other)]
    Unknown,
}

/// Full snapshot of one token's bid/ask ladder.
#[derive(Debug, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    pub market: Option<String>,
    pub bids: Vec<WireLevel>,
    pub asks: Vec<WireLevel>,
    pub timestamp: Option<String>,
    pub hash: Option<String>,
}

/// Incremental changes to one token's ladder.
#[derive(Debug, Deserialize)]
pub struct PriceChangeMessage {
    pub asset_id: String,
    pub market: Option<String>,
    pub changes: Vec<PriceChange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceChange {
    pub price: String,
    pub side: String,
    pub size: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_message_serializes_expected_shape() {
        let msg = SubscribeMessage::new(vec!["tok-1".to_string(), "tok-2".to_string()]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "market");
        assert_eq!(json["assets_ids"], serde_json::json!(["tok-1", "tok-2"]));
        assert_eq!(json["custom_feature_enabled"], true);
    }

    #[test]
    fn book_event_deserializes_by_tag() {
        let raw = serde_json::json!({
            "event_type": "book",
            "asset_id": "tok-1",
            "bids": [{"price": "0.40", "size": "10"}],
            "asks": [{"price": "0.45", "size": "5"}],
        });
        let event: FeedEvent = serde_json::from_value(raw).unwrap();
        match event {
            FeedEvent::Book(book) => {
                assert_eq!(book.asset_id, "tok-1");
                assert_eq!(book.bids.len(), 1);
            }
            _ => panic!("expected Book variant"),
        }
    }

    #[test]
    fn unknown_event_type_falls_through() {
        let raw = serde_json::json!({"event_type": "heartbeat"});
        let event: FeedEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(event, FeedEvent::Unknown));
    }
}
