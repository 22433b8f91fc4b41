//! Paper Trading Module
//!
//! Simulates binary up/down bets against a reference price without
//! risking capital. Every settled trade lands in an append-only log.

mod engine;
mod position;
mod stats;
mod trade_log;

pub use engine::{OpenRequest, PaperEngine, Settlement};
pub use position::{binary_payout, settlement_outcome, Position};
pub use stats::{Stats, Summary};
pub use trade_log::{iso_millis, CsvTradeLog, MemoryTradeLog, TradeLog, TradeRow};

use crate::error::Result;
use std::path::Path;

/// Rebuild statistics from an existing CSV trade log
pub fn replay_summary(path: impl AsRef<Path>) -> Result<Summary> {
    let mut stats = Stats::default();
    for row in CsvTradeLog::new(path.as_ref()).read_rows()? {
        stats.record(row.pnl);
    }
    Ok(Summary::new(&stats, None, 0))
}
