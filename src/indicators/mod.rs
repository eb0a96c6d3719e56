// Technical indicators module
// Wilder RSI, both from full history and as a streaming tracker

pub mod rsi;

pub use rsi::{calculate_rsi, RsiTracker, NEUTRAL_RSI};
