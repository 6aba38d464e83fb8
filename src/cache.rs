//! Thread-safe order book cache: applies snapshots and deltas from the
//! feed and serves atomic best-bid/best-ask reads to the detector.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::book::{Price, Volume};
use crate::domain::ids::TokenId;
use crate::feed::messages::{BookMessage, PriceChange};
use crate::ladder::Ladder;

struct Book {
    bids: Ladder,
    asks: Ladder,
    updated_at: Instant,
}

/// A read-only view of one token's book, handed out by [`BookCache::get`].
#[derive(Debug, Clone, Copy)]
pub struct BookView {
    pub best_bid: Option<(Price, Volume)>,
    pub best_ask: Option<(Price, Volume)>,
}

pub struct BookCache {
    books: RwLock<HashMap<TokenId, Book>>,
}

impl BookCache {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the full ladder for a token. Called on the initial `book`
    /// event after subscribing, and on any later resync.
    pub fn apply_snapshot(&self, msg: &BookMessage) {
        let token_id = TokenId::from(msg.asset_id.clone());
        let mut bids = Ladder::new();
        for level in &msg.bids {
            if let (Ok(size), price) = (level.size_decimal(), level.price.as_str()) {
                bids.set(price, size);
            }
        }
        let mut asks = Ladder::new();
        for level in &msg.asks {
            if let (Ok(size), price) = (level.size_decimal(), level.price.as_str()) {
                asks.set(price, size);
            }
        }

        let bid_count = bids.len();
        let ask_count = asks.len();
        self.books.write().insert(
            token_id,
            Book {
                bids,
                asks,
                updated_at: Instant::now(),
            },
        );
        debug!(bids = bid_count, asks = ask_count, "applied book snapshot");
    }

    /// Apply incremental changes from a `price_change` event. If no
    /// snapshot has been applied yet for this token, the delta is dropped
    /// silently: there is no ladder to patch, and patching one anyway would
    /// produce a book that looks complete while actually being partial.
    pub fn apply_delta(&self, asset_id: &str, changes: &[PriceChange]) {
        let token_id = TokenId::from(asset_id.to_string());
        let mut books = self.books.write();
        let Some(book) = books.get_mut(&token_id) else {
            debug!(token = asset_id, "delta received before snapshot, dropping");
            return;
        };

        for change in changes {
            let Ok(size) = change.size.parse() else {
                continue;
            };
            let ladder = if change.side.eq_ignore_ascii_case("buy") {
                &mut book.bids
            } else {
                &mut book.asks
            };
            ladder.set(&change.price, size);
        }
        book.updated_at = Instant::now();
    }

    pub fn get(&self, token_id: &TokenId) -> Option<BookView> {
        let books = self.books.read();
        books.get(token_id).map(|b| BookView {
            best_bid: b.bids.best_high(),
            best_ask: b.asks.best_low(),
        })
    }

    /// Read both legs of a pair under a single lock acquisition, so the
    /// detector never compares a pair whose two sides came from different
    /// instants in time.
    pub fn get_pair(&self, a: &TokenId, b: &TokenId) -> (Option<BookView>, Option<BookView>) {
        let books = self.books.read();
        let view = |book: &Book| BookView {
            best_bid: book.bids.best_high(),
            best_ask: book.asks.best_low(),
        };
        (books.get(a).map(view), books.get(b).map(view))
    }

    pub fn age_seconds(&self, token_id: &TokenId) -> Option<f64> {
        self.books
            .read()
            .get(token_id)
            .map(|b| b.updated_at.elapsed().as_secs_f64())
    }

    pub fn len(&self) -> usize {
        self.books.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BookCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::WireLevel;

    fn level(price: &str, size: &str) -> WireLevel {
        WireLevel {
            price: price.to_string(),
            size: size.to_string(),
        }
    }

    #[test]
    fn snapshot_then_best_bid_ask() {
        let cache = BookCache::new();
        cache.apply_snapshot(&BookMessage {
            asset_id: "tok-1".to_string(),
            market: None,
            bids: vec![level("0.40", "10"), level("0.38", "5")],
            asks: vec![level("0.45", "8"), level("0.47", "3")],
            timestamp: None,
            hash: None,
        });

        let view = cache.get(&TokenId::from("tok-1")).unwrap();
        assert_eq!(view.best_bid.unwrap().0.to_string(), "0.40");
        assert_eq!(view.best_ask.unwrap().0.to_string(), "0.45");
    }

    #[test]
    fn delta_before_snapshot_is_dropped_silently() {
        let cache = BookCache::new();
        cache.apply_delta(
            "tok-1",
            &[PriceChange {
                price: "0.40".to_string(),
                side: "BUY".to_string(),
                size: "10".to_string(),
            }],
        );
        assert!(cache.get(&TokenId::from("tok-1")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn delta_removes_level_on_zero_size() {
        let cache = BookCache::new();
        cache.apply_snapshot(&BookMessage {
            asset_id: "tok-1".to_string(),
            market: None,
            bids: vec![level("0.40", "10")],
            asks: vec![],
            timestamp: None,
            hash: None,
        });
        cache.apply_delta(
            "tok-1",
            &[PriceChange {
                price: "0.40".to_string(),
                side: "BUY".to_string(),
                size: "0".to_string(),
            }],
        );
        let view = cache.get(&TokenId::from("tok-1")).unwrap();
        assert!(view.best_bid.is_none());
    }

    #[test]
    fn get_pair_reads_both_legs_atomically() {
        let cache = BookCache::new();
        cache.apply_snapshot(&BookMessage {
            asset_id: "yes".to_string(),
            market: None,
            bids: vec![],
            asks: vec![level("0.40", "10")],
            timestamp: None,
            hash: None,
        });
        cache.apply_snapshot(&BookMessage {
            asset_id: "no".to_string(),
            market: None,
            bids: vec![],
            asks: vec![level("0.45", "10")],
            timestamp: None,
            hash: None,
        });

        let (yes, no) = cache.get_pair(&TokenId::from("yes"), &TokenId::from("no"));
        assert_eq!(yes.unwrap().best_ask.unwrap().0.to_string(), "0.40");
        assert_eq!(no.unwrap().best_ask.unwrap().0.to_string(), "0.45");
    }
}
