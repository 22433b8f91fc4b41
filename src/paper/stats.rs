//! Running performance statistics

use super::Position;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cumulative results of every settled trade.
///
/// Only grows; there is no reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_pnl: Decimal,
    /// Tracks `total_pnl`; there is no capital base or fee model
    pub equity: Decimal,
    pub peak_equity: Decimal,
    pub max_drawdown: Decimal,
    pub sum_win: Decimal,
    /// Sum of losing PnL, never positive
    pub sum_loss: Decimal,
}

impl Stats {
    /// Fold one realized PnL into the aggregates. Breakeven counts as a win.
    pub fn record(&mut self, pnl: Decimal) {
        self.trades += 1;
        if pnl >= Decimal::ZERO {
            self.wins += 1;
            self.sum_win += pnl;
        } else {
            self.losses += 1;
            self.sum_loss += pnl;
        }

        self.total_pnl += pnl;
        self.equity += pnl;
        self.peak_equity = self.peak_equity.max(self.equity);
        self.max_drawdown = self.max_drawdown.max(self.peak_equity - self.equity);
    }

    pub fn win_rate(&self) -> Decimal {
        ratio(Decimal::from(self.wins), self.trades)
    }

    pub fn avg_win(&self) -> Decimal {
        ratio(self.sum_win, self.wins)
    }

    pub fn avg_loss(&self) -> Decimal {
        ratio(self.sum_loss, self.losses)
    }

    /// Distance below the running peak right now
    pub fn current_drawdown(&self) -> Decimal {
        self.peak_equity - self.equity
    }
}

fn ratio(numerator: Decimal, count: u64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        numerator / Decimal::from(count)
    }
}

/// Read-only snapshot for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub equity: Decimal,
    pub peak_equity: Decimal,
    pub max_drawdown: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub position: Option<Position>,
    /// Settled trades whose log row could not be written
    pub log_failures: u64,
}

impl Summary {
    pub fn new(stats: &Stats, position: Option<Position>, log_failures: u64) -> Self {
        Self {
            trades: stats.trades,
            wins: stats.wins,
            losses: stats.losses,
            win_rate: stats.win_rate(),
            total_pnl: stats.total_pnl,
            equity: stats.equity,
            peak_equity: stats.peak_equity,
            max_drawdown: stats.max_drawdown,
            avg_win: stats.avg_win(),
            avg_loss: stats.avg_loss(),
            position,
            log_failures,
        }
    }
}
