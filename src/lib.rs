//! Real-time arbitrage core for binary-outcome prediction markets.
//!
//! Wires a multiplexed market-data feed into an order-book cache, a
//! fee-adjusted arbitrage detector, and a dispatcher that fires paired
//! legs with partial-fill compensation.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod detector;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod feed;
pub mod gateway;
pub mod ladder;
pub mod registry;
pub mod risk;
pub mod stats;

pub use error::{Error, Result};
