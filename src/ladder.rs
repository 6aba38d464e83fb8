//! Price ladder: a canonical price-string-keyed map of resting size.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::book::{Price, Volume};

/// One side (bid or ask) of an order book, keyed by the price's wire string
/// rather than its parsed `Decimal` value.
///
/// Keying by string means a delta that zeroes a level removes the exact key
/// a prior snapshot inserted, so there's no risk of two distinct textual
/// prices (e.g. "0.50" and "0.5") colliding or leaving a stale level behind.
#[derive(Debug, Clone, Default)]
pub struct Ladder {
    levels: HashMap<String, Volume>,
}

impl Ladder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels<'a>(entries: impl IntoIterator<Item = (&'a str, Volume)>) -> Self {
        let mut ladder = Self::new();
        for (price, size) in entries {
            ladder.set(price, size);
        }
        ladder
    }

    /// Insert or replace a level. A zero or negative size removes it.
    pub fn set(&mut self, price: &str, size: Volume) {
        if size <= Decimal::ZERO {
            self.levels.remove(price);
        } else {
            self.levels.insert(price.to_string(), size);
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn best_by(&self, ordering: Ordering) -> Option<(Price, Volume)> {
        self.levels
            .iter()
            .filter_map(|(price, size)| price.parse::<Price>().ok().map(|p| (p, *size)))
            .fold(None, |best, (price, size)| match &best {
                None => Some((price, size)),
                Some((best_price, _)) if price.cmp(best_price) == ordering => Some((price, size)),
                _ => best,
            })
    }

    /// Lowest price in the ladder (best ask).
    pub fn best_low(&self) -> Option<(Price, Volume)> {
        self.best_by(Ordering::Less)
    }

    /// Highest price in the ladder (best bid).
    pub fn best_high(&self) -> Option<(Price, Volume)> {
        self.best_by(Ordering::Greater)
    }

    pub fn levels(&self) -> impl Iterator<Item = (&str, Volume)> {
        self.levels.iter().map(|(p, s)| (p.as_str(), *s))
    }
}
