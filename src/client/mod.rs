//! Market data clients

pub mod kraken;

pub use kraken::{
    normalize_candles, parse_interval_minutes, pick_result_key, to_number, CandleInterval,
    KrakenClient,
};

use crate::error::Result;
use crate::types::Candle;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Read-only reference market feed.
///
/// Each call is one request/response cycle with no retry or caching;
/// backoff belongs to whoever drives the loop.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Historical candles, most recent last
    async fn fetch_candles(
        &self,
        interval: Option<CandleInterval>,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>>;

    /// Last traded price, `None` if the ticker carries no usable value
    async fn fetch_last_price(&self) -> Result<Option<Decimal>>;
}
