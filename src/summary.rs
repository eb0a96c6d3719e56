use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Direction, TradeRecord};

/// End-of-day aggregate over trades that exited on `date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_trades: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    pub total_profit: f64,
    pub avg_profit: f64,
    pub winning_trades: usize,
    pub losing_trades: usize, // everything that is not a win, breakeven included
}

impl DailySummary {
    /// Aggregate a snapshot of the trade history
    ///
    /// Returns None when no trade exited on `date`.
    pub fn from_trades(date: NaiveDate, trades: &[TradeRecord]) -> Option<Self> {
        let today: Vec<&TradeRecord> = trades.iter().filter(|t| t.exit_date() == date).collect();

        if today.is_empty() {
            return None;
        }

        let total_trades = today.len();
        let long_trades = today
            .iter()
            .filter(|t| t.direction == Direction::Long)
            .count();
        let total_profit: f64 = today.iter().map(|t| t.profit).sum();
        let winning_trades = today.iter().filter(|t| t.is_win()).count();

        Some(Self {
            date,
            total_trades,
            long_trades,
            short_trades: total_trades - long_trades,
            total_profit,
            avg_profit: total_profit / total_trades as f64,
            winning_trades,
            losing_trades: total_trades - winning_trades,
        })
    }

    pub fn win_rate(&self) -> f64 {
        self.winning_trades as f64 / self.total_trades as f64 * 100.0
    }
}
