use anyhow::Context;
use chrono::NaiveTime;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::strategy::StrategyConfig;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "rsibot.toml";

/// Where the journal writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub trade_log: PathBuf,
    pub daily_summary: PathBuf,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trade_log: PathBuf::from("trade_log.csv"),
            daily_summary: PathBuf::from("daily_summary.csv"),
        }
    }
}

/// Bar replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// CSV of `timestamp,close` rows
    pub bars: Option<PathBuf>,
    /// Delay between replayed bars, 0 for as fast as possible
    pub pace_ms: u64,
    /// Channel capacity between the replay task and the engine
    pub channel_capacity: usize,
    /// Paper executor slippage in basis points
    pub slippage_bps: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bars: None,
            pace_ms: 0,
            channel_capacity: 64,
            slippage_bps: 0.0,
        }
    }
}

/// Full application configuration
///
/// Layered lowest to highest: built-in defaults, `rsibot.toml` (or the file
/// given on the command line), then `RSIBOT__*` environment variables, e.g.
/// `RSIBOT__STRATEGY__EXIT_MIN=47`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub symbol: String,
    pub quantity: f64,
    pub strategy: StrategyConfig,
    pub journal: JournalConfig,
    pub feed: FeedConfig,
    /// Time of day in UTC (`HH:MM`), compared against bar timestamps, from
    /// which the daily summary is written. Not exchange-local: the default
    /// 21:00 falls after the US close in both summer and winter time.
    pub summary_time: String,
    /// Seed for the exit band draws; random when unset
    pub exit_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            quantity: 100.0,
            strategy: StrategyConfig::default(),
            journal: JournalConfig::default(),
            feed: FeedConfig::default(),
            summary_time: "21:00".to_string(),
            exit_seed: None,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration
    ///
    /// A missing default file is fine; an explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("RSIBOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("failed to read configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.symbol.trim().is_empty() {
            anyhow::bail!("symbol must not be empty");
        }
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            anyhow::bail!("quantity must be positive, got {}", self.quantity);
        }
        if self.feed.channel_capacity == 0 {
            anyhow::bail!("feed.channel_capacity must be at least 1");
        }
        self.summary_time()?;
        self.strategy.validate()
    }

    pub fn summary_time(&self) -> anyhow::Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.summary_time, "%H:%M")
            .with_context(|| format!("summary_time must be HH:MM, got {:?}", self.summary_time))
    }
}
