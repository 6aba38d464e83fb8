//! Market-data feed: wire types and the persistent connection that serves
//! them to the book cache.

pub mod client;
pub mod messages;

pub use client::{FeedClient, FeedConfig, FeedStatsSnapshot};
pub use messages::FeedEvent;
