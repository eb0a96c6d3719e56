use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single closing price for the traded instrument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self { timestamp, close }
    }
}

/// Current exposure of the position state machine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Flat,
    Long,
    Short,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Flat => "Flat",
            Side::Long => "Long",
            Side::Short => "Short",
        }
    }
}

/// Direction of an open or completed trade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Direction::Long => Side::Long,
            Direction::Short => Side::Short,
        }
    }
}

/// Order side sent to the execution collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

/// What the state machine wants to do on this bar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Action {
    EnterLong,
    EnterShort,
    /// Close the open trade in the given direction
    Exit(Direction),
}

/// A decision emitted by the position state machine.
///
/// A decision is an intent, not an execution: the state machine only changes
/// side once the fill has been confirmed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub rsi: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

impl Decision {
    /// Buy to open long / close short, sell to open short / close long
    pub fn order_side(&self) -> OrderSide {
        match self.action {
            Action::EnterLong | Action::Exit(Direction::Short) => OrderSide::Buy,
            Action::EnterShort | Action::Exit(Direction::Long) => OrderSide::Sell,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.action, Action::Exit(_))
    }
}

/// Trade that has been entered but not yet exited
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenTrade {
    pub id: Uuid,
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_rsi: f64,
    pub quantity: f64,
}

impl OpenTrade {
    /// Complete the trade at the confirmed exit fill
    pub fn close(self, exit_time: DateTime<Utc>, exit_price: f64, exit_rsi: f64) -> TradeRecord {
        let profit = (exit_price - self.entry_price) * self.quantity * self.direction.sign();
        let duration_minutes = (exit_time - self.entry_time).num_seconds() as f64 / 60.0;

        TradeRecord {
            id: self.id,
            entry_time: self.entry_time,
            exit_time,
            direction: self.direction,
            entry_price: self.entry_price,
            exit_price,
            quantity: self.quantity,
            profit,
            entry_rsi: self.entry_rsi,
            exit_rsi,
            duration_minutes,
        }
    }
}

/// Completed round trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: Uuid,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub profit: f64,
    pub entry_rsi: f64,
    pub exit_rsi: f64,
    pub duration_minutes: f64,
}

impl TradeRecord {
    pub fn exit_date(&self) -> NaiveDate {
        self.exit_time.date_naive()
    }

    pub fn is_win(&self) -> bool {
        self.profit > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn open_trade(direction: Direction) -> OpenTrade {
        OpenTrade {
            id: Uuid::new_v4(),
            direction,
            entry_time: Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap(),
            entry_price: 100.0,
            entry_rsi: 35.0,
            quantity: 100.0,
        }
    }

    #[test]
    fn test_long_trade_profit() {
        let trade = open_trade(Direction::Long);
        let exit_time = trade.entry_time + Duration::minutes(45);
        let record = trade.close(exit_time, 101.5, 50.0);

        assert!((record.profit - 150.0).abs() < 1e-9);
        assert_eq!(record.duration_minutes, 45.0);
        assert!(record.is_win());
    }

    #[test]
    fn test_short_trade_profit_is_inverted() {
        let trade = open_trade(Direction::Short);
        let exit_time = trade.entry_time + Duration::seconds(90);
        let record = trade.close(exit_time, 101.0, 49.0);

        assert!((record.profit + 100.0).abs() < 1e-9);
        assert_eq!(record.duration_minutes, 1.5);
        assert!(!record.is_win());
    }

    #[test]
    fn test_order_side_for_each_action() {
        let decision = |action| Decision {
            action,
            rsi: 50.0,
            price: 100.0,
            timestamp: Utc::now(),
        };

        assert_eq!(decision(Action::EnterLong).order_side(), OrderSide::Buy);
        assert_eq!(decision(Action::EnterShort).order_side(), OrderSide::Sell);
        assert_eq!(decision(Action::Exit(Direction::Long)).order_side(), OrderSide::Sell);
        assert_eq!(decision(Action::Exit(Direction::Short)).order_side(), OrderSide::Buy);
    }
}
