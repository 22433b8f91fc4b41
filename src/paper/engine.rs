//! Single-position paper trading engine
//!
//! Reacts to two inputs: entry signals and price ticks. At most one
//! position is open at a time; settling it is atomic and feeds [`Stats`].
//!
//! Malformed input (missing side, price or strike) is never an error.
//! Every such call is a no-op that returns `None`, so a partial upstream
//! message can't take down the simulation loop.

use super::position::{binary_payout, settlement_outcome};
use super::trade_log::{iso_millis, TradeLog, TradeRow};
use super::{Position, Stats, Summary};
use crate::types::{EntrySignal, PriceTick, Side, SignalAction};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Parameters for opening a position. Missing fields reject the open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenRequest {
    pub side: Option<Side>,
    pub entry_price: Option<Decimal>,
    pub market_slug: Option<String>,
    pub price_to_beat: Option<Decimal>,
    pub settlement_ms: Option<i64>,
    /// Defaults to the current time
    pub timestamp_ms: Option<i64>,
}

/// Result of settling the open position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub outcome: Side,
    pub payout: Decimal,
    pub pnl: Decimal,
    /// Equity after this trade
    pub equity: Decimal,
    /// 1-based
    pub trade_number: u64,
}

pub struct PaperEngine<L: TradeLog> {
    position: Option<Position>,
    stats: Stats,
    log: L,
    log_failures: u64,
}

impl<L: TradeLog> PaperEngine<L> {
    pub fn new(log: L) -> Self {
        Self {
            position: None,
            stats: Stats::default(),
            log,
            log_failures: 0,
        }
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn trade_log(&self) -> &L {
        &self.log
    }

    /// Closed → Open. The only place a [`Position`] is created.
    pub fn open_position(&mut self, req: OpenRequest) -> Option<&Position> {
        if self.position.is_some() {
            debug!("Open rejected: a position is already open");
            return None;
        }
        let (Some(side), Some(entry_price), Some(price_to_beat)) =
            (req.side, req.entry_price, req.price_to_beat)
        else {
            debug!("Open rejected: missing side, entry price or price to beat");
            return None;
        };

        let position = Position {
            side,
            entry_price,
            market_slug: req.market_slug,
            price_to_beat,
            settlement_ms: req.settlement_ms,
            entry_time_ms: req.timestamp_ms.unwrap_or_else(now_ms),
        };
        info!(
            "📥 Opened {} @ {} on {} (beat {})",
            position.side,
            position.entry_price,
            position.market_slug.as_deref().unwrap_or("-"),
            position.price_to_beat
        );

        Some(&*self.position.insert(position))
    }

    /// Open → Closed.
    ///
    /// The slot is cleared and stats updated before the log row is
    /// written; a failed append is counted but doesn't undo the settlement.
    pub fn close_position(&mut self, exit_price: Decimal, exit_time_ms: Option<i64>) -> Option<Settlement> {
        let pos = self.position.take()?;

        let outcome = settlement_outcome(exit_price, pos.price_to_beat);
        let payout = binary_payout(pos.side, outcome);
        let pnl = payout - pos.entry_price;
        self.stats.record(pnl);

        let settlement = Settlement {
            outcome,
            payout,
            pnl,
            equity: self.stats.equity,
            trade_number: self.stats.trades,
        };
        info!(
            "📤 Settled #{} {} vs outcome {} | PnL {} | equity {}",
            settlement.trade_number, pos.side, outcome, pnl, settlement.equity
        );

        let row = TradeRow {
            timestamp: iso_millis(now_ms()),
            market_slug: pos.market_slug,
            side: pos.side,
            entry_time: iso_millis(pos.entry_time_ms),
            entry_price: pos.entry_price.normalize(),
            price_to_beat: pos.price_to_beat.normalize(),
            settlement_time: pos.settlement_ms.map(iso_millis).unwrap_or_default(),
            exit_time: iso_millis(exit_time_ms.unwrap_or_else(now_ms)),
            exit_price: exit_price.normalize(),
            outcome,
            payout,
            pnl: pnl.normalize(),
            equity: settlement.equity.normalize(),
            trade_number: settlement.trade_number,
        };
        if let Err(e) = self.log.append(&row) {
            self.log_failures += 1;
            warn!("Failed to log trade #{}: {}", row.trade_number, e);
        }

        Some(settlement)
    }

    /// Entry boundary. Opens only on `ENTER` with a strike and a price for the chosen side.
    pub fn on_signal(&mut self, signal: &EntrySignal) -> Option<&Position> {
        if signal.action != SignalAction::Enter || self.position.is_some() {
            return None;
        }
        signal.price_to_beat?;
        let entry_price = signal.entry_price()?;

        self.open_position(OpenRequest {
            side: signal.side,
            entry_price: Some(entry_price),
            market_slug: signal.market_slug.clone(),
            price_to_beat: signal.price_to_beat,
            settlement_ms: signal.settlement_ms,
            timestamp_ms: signal.timestamp_ms,
        })
    }

    /// Price boundary. Settles once the deadline passes or the market rolls over.
    pub fn on_tick(&mut self, tick: &PriceTick) -> Option<Settlement> {
        let position = self.position.as_ref()?;
        let current_price = tick.current_price?;
        let now = tick.now_ms.unwrap_or_else(now_ms);

        if !position.should_settle(tick.market_slug.as_deref(), now) {
            return None;
        }
        self.close_position(current_price, Some(now))
    }

    pub fn get_summary(&self) -> Summary {
        Summary::new(&self.stats, self.position.clone(), self.log_failures)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
