//! Price/size primitives shared by the book cache and the detector.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A price, always in `(0, 1)` for a binary-outcome token.
pub type Price = Decimal;

/// A resting size at a price level.
pub type Volume = Decimal;

/// A single price/size pair as carried on the wire, before being parsed into
/// [`Decimal`]. Kept as strings because the feed emits fixed-precision
/// decimal text and parsing to `f64` would introduce drift.
#[derive(Debug, Clone, Deserialize)]
pub struct WireLevel {
    pub price: String,
    pub size: String,
}

impl WireLevel {
    pub fn price_decimal(&self) -> Result<Price, rust_decimal::Error> {
        self.price.parse()
    }

    pub fn size_decimal(&self) -> Result<Volume, rust_decimal::Error> {
        self.size.parse()
    }
}
