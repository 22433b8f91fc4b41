//! Append-only trade log
//!
//! One CSV row per settled trade, fixed column order (see [`TradeRow::HEADER`]).

use crate::error::Result;
use crate::types::Side;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A settled trade as written to the log.
///
/// Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub timestamp: String,
    pub market_slug: Option<String>,
    pub side: Side,
    pub entry_time: String,
    pub entry_price: Decimal,
    pub price_to_beat: Decimal,
    /// Empty when the position had no deadline
    pub settlement_time: String,
    pub exit_time: String,
    pub exit_price: Decimal,
    pub outcome: Side,
    pub payout: Decimal,
    pub pnl: Decimal,
    pub equity: Decimal,
    pub trade_number: u64,
}

impl TradeRow {
    pub const HEADER: [&'static str; 14] = [
        "timestamp",
        "market_slug",
        "side",
        "entry_time",
        "entry_price",
        "price_to_beat",
        "settlement_time",
        "exit_time",
        "exit_price",
        "outcome",
        "payout",
        "pnl",
        "equity",
        "trade_number",
    ];
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
/// Out-of-range timestamps render as an empty string.
pub fn iso_millis(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Durable sink for settled trades
#[cfg_attr(test, mockall::automock)]
pub trait TradeLog: Send {
    fn append(&mut self, row: &TradeRow) -> Result<()>;
}

/// CSV file log. The header is written when the file is new or empty.
#[derive(Debug, Clone)]
pub struct CsvTradeLog {
    path: PathBuf,
}

impl CsvTradeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row back, in file order
    pub fn read_rows(&self) -> Result<Vec<TradeRow>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize::<TradeRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl TradeLog for CsvTradeLog {
    fn append(&mut self, row: &TradeRow) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(TradeRow::HEADER)?;
        }
        writer.serialize(row)?;
        writer.flush()?;

        debug!("Logged trade #{} to {}", row.trade_number, self.path.display());
        Ok(())
    }
}

/// In-memory log, handy for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryTradeLog {
    rows: Vec<TradeRow>,
}

impl MemoryTradeLog {
    pub fn rows(&self) -> &[TradeRow] {
        &self.rows
    }
}

impl TradeLog for MemoryTradeLog {
    fn append(&mut self, row: &TradeRow) -> Result<()> {
        self.rows.push(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_row(trade_number: u64, settlement_time: &str) -> TradeRow {
        TradeRow {
            timestamp: iso_millis(1_714_564_800_000),
            market_slug: Some("btc-updown-15m-1714564800".to_string()),
            side: Side::Up,
            entry_time: iso_millis(1_714_564_000_000),
            entry_price: dec!(0.4),
            price_to_beat: dec!(100),
            settlement_time: settlement_time.to_string(),
            exit_time: iso_millis(1_714_564_800_000),
            exit_price: dec!(105),
            outcome: Side::Up,
            payout: dec!(1),
            pnl: dec!(0.6),
            equity: dec!(0.6),
            trade_number,
        }
    }

    #[test]
    fn test_iso_millis() {
        assert_eq!(iso_millis(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_millis(1_714_564_800_123), "2024-05-01T12:00:00.123Z");
        assert_eq!(iso_millis(i64::MAX), "");
    }

    #[test]
    fn test_csv_log_writes_header_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("paper_trades.csv");
        let mut log = CsvTradeLog::new(&path);

        log.append(&sample_row(1, "")).unwrap();
        log.append(&sample_row(2, "2024-05-01T12:00:00.000Z")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], TradeRow::HEADER.join(","));
        assert_eq!(
            lines[1],
            "2024-05-01T12:00:00.000Z,btc-updown-15m-1714564800,UP,2024-05-01T11:46:40.000Z,\
             0.4,100,,2024-05-01T12:00:00.000Z,105,UP,1,0.6,0.6,1"
        );
        assert!(lines[2].ends_with(",2"));
    }

    #[test]
    fn test_csv_log_appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trades.csv");

        CsvTradeLog::new(&path).append(&sample_row(1, "")).unwrap();
        let mut log = CsvTradeLog::new(&path);
        log.append(&sample_row(2, "")).unwrap();

        let rows = log.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], sample_row(1, ""));
        assert_eq!(rows[1].trade_number, 2);
    }

    #[test]
    fn test_missing_slug_round_trips_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trades.csv");
        let mut row = sample_row(1, "");
        row.market_slug = None;

        let mut log = CsvTradeLog::new(&path);
        log.append(&row).unwrap();
        let rows = log.read_rows().unwrap();
        assert_eq!(rows[0].market_slug, None);
    }

    #[test]
    fn test_memory_log_keeps_rows() {
        let mut log = MemoryTradeLog::default();
        log.append(&sample_row(1, "")).unwrap();
        assert_eq!(log.rows().len(), 1);
    }
}
