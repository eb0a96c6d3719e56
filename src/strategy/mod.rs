// Trading strategy module
pub mod exit_band;
pub mod position_machine;

use serde::{Deserialize, Serialize};

pub use exit_band::{ExitThreshold, FixedExit, RandomExit};
pub use position_machine::PositionMachine;

/// RSI threshold strategy parameters
///
/// Entry rules (only when flat):
/// - Long: previous RSI below `long_trigger` and current RSI at or above `long_entry`
/// - Short: previous RSI above `short_trigger` and current RSI at or above `short_entry`
///
/// Exit rule (only when in a position): a threshold is drawn uniformly from
/// `[exit_min, exit_max]` every bar. Longs exit at or above it, shorts at or below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// RSI lookback period
    pub rsi_period: usize,
    pub long_trigger: f64,
    pub long_entry: f64,
    pub short_trigger: f64,
    pub short_entry: f64,
    pub exit_min: f64,
    pub exit_max: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            long_trigger: 32.0,
            long_entry: 34.8,
            short_trigger: 68.0,
            short_entry: 71.7,
            exit_min: 48.0,
            exit_max: 52.0,
        }
    }
}

impl StrategyConfig {
    /// Reject parameter sets the state machine cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rsi_period == 0 {
            anyhow::bail!("rsi_period must be at least 1");
        }

        let levels = [
            ("long_trigger", self.long_trigger),
            ("long_entry", self.long_entry),
            ("short_trigger", self.short_trigger),
            ("short_entry", self.short_entry),
            ("exit_min", self.exit_min),
            ("exit_max", self.exit_max),
        ];
        for (name, value) in levels {
            if !(0.0..=100.0).contains(&value) {
                anyhow::bail!("{} must be within [0, 100], got {}", name, value);
            }
        }

        if self.exit_min > self.exit_max {
            anyhow::bail!(
                "exit_min ({}) must not exceed exit_max ({})",
                self.exit_min,
                self.exit_max
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = StrategyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rsi_period, 14);
        assert_eq!(config.short_entry, 71.7);
    }

    #[test]
    fn test_inverted_exit_band_rejected() {
        let config = StrategyConfig {
            exit_min: 55.0,
            exit_max: 45.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exit_min"));
    }

    #[test]
    fn test_out_of_range_level_rejected() {
        let config = StrategyConfig {
            long_entry: 120.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = StrategyConfig {
            rsi_period: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
