//! Open position and settlement rules

use crate::types::Side;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The single simulated position the engine may hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Direction bet on
    pub side: Side,
    /// Contract price paid for `side`
    pub entry_price: Decimal,
    pub market_slug: Option<String>,
    /// Strike the exit price is compared against
    pub price_to_beat: Decimal,
    /// Forced settlement deadline (epoch ms)
    pub settlement_ms: Option<i64>,
    pub entry_time_ms: i64,
}

impl Position {
    /// Deadline reached
    pub fn settlement_due(&self, now_ms: i64) -> bool {
        self.settlement_ms.is_some_and(|deadline| now_ms >= deadline)
    }

    /// The tick belongs to a different contract than the one we entered.
    /// Unknown slugs on either side never count as a rollover.
    pub fn market_rolled(&self, tick_slug: Option<&str>) -> bool {
        match (tick_slug, self.market_slug.as_deref()) {
            (Some(tick), Some(ours)) if !tick.is_empty() && !ours.is_empty() => tick != ours,
            _ => false,
        }
    }

    pub fn should_settle(&self, tick_slug: Option<&str>, now_ms: i64) -> bool {
        self.settlement_due(now_ms) || self.market_rolled(tick_slug)
    }
}

/// UP only when the exit strictly beats the strike; a tie settles DOWN
pub fn settlement_outcome(exit_price: Decimal, price_to_beat: Decimal) -> Side {
    if exit_price > price_to_beat {
        Side::Up
    } else {
        Side::Down
    }
}

/// Winner-take-all: 1 if the bet matches the outcome, else 0
pub fn binary_payout(side: Side, outcome: Side) -> Decimal {
    if side == outcome {
        Decimal::ONE
    } else {
        Decimal::ZERO
    }
}
