//! Up/Down Paper Trading Simulator
//!
//! Simulates binary up/down bets against a live reference price and keeps
//! an audit trail plus running performance statistics, so a strategy can
//! be validated before real funds are committed.
//!
//! ## Architecture
//!
//! ```text
//! Strategy signals ─┐
//!                   ├→ Driver → PaperEngine → TradeLog (CSV)
//! Kraken (polled) ──┘               ↓
//!                              Dashboard (/summary)
//! ```

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod monitor;
pub mod paper;
pub mod types;

#[cfg(test)]
mod config_tests;
