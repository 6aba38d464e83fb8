//! Core domain types: identifiers, market catalog records, price/size
//! primitives, and detected opportunities.

pub mod book;
pub mod ids;
pub mod market;
pub mod opportunity;

pub use book::{Price, Volume, WireLevel};
pub use ids::{MarketId, OrderId, TokenId};
pub use market::{build_record, extract_token_ids, MarketRecord, Polarity, RawMarket, RawToken};
pub use opportunity::Opportunity;
