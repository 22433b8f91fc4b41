//! Core types shared by the data adapter, the engine and the driver

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a binary bet, also used for the settled outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Up,
    Down,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Up => "UP",
            Side::Down => "DOWN",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision emitted by the strategy layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalAction {
    Enter,
    NoTrade,
    #[serde(other)]
    Other,
}

/// Normalized OHLCV candle. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub open_time: i64,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub close_time: i64,
}

/// Entry instruction consumed from the strategy layer.
///
/// Every field except `action` may be missing; the engine treats an
/// incomplete signal as a no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySignal {
    pub action: SignalAction,
    #[serde(default)]
    pub side: Option<Side>,
    #[serde(default)]
    pub market_slug: Option<String>,
    #[serde(default)]
    pub price_to_beat: Option<Decimal>,
    #[serde(default)]
    pub settlement_ms: Option<i64>,
    /// Execution price of the UP contract
    #[serde(default)]
    pub market_up: Option<Decimal>,
    /// Execution price of the DOWN contract
    #[serde(default)]
    pub market_down: Option<Decimal>,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl EntrySignal {
    /// Price paid for the requested side, if the signal carries it
    pub fn entry_price(&self) -> Option<Decimal> {
        match self.side? {
            Side::Up => self.market_up,
            Side::Down => self.market_down,
        }
    }
}

/// Reference-price update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    #[serde(default)]
    pub market_slug: Option<String>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub now_ms: Option<i64>,
}

/// One line of the driver's inbound feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedEvent {
    Signal(EntrySignal),
    Tick(PriceTick),
}
