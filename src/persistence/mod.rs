use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::models::{PriceSample, TradeRecord};
use crate::summary::DailySummary;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TRADE_HEADER: [&str; 10] = [
    "Entry Time",
    "Exit Time",
    "Direction",
    "Entry Price",
    "Exit Price",
    "Quantity",
    "Profit",
    "Entry RSI",
    "Exit RSI",
    "Duration (min)",
];

const SUMMARY_HEADER: [&str; 8] = [
    "Date",
    "Total Trades",
    "Long Trades",
    "Short Trades",
    "Total Profit",
    "Avg Profit/Trade",
    "Winning Trades",
    "Losing Trades",
];

/// Durable sink for completed trades and daily aggregates
pub trait TradeJournal: Send {
    fn record_trade(&mut self, trade: &TradeRecord) -> anyhow::Result<()>;

    fn record_summary(&mut self, summary: &DailySummary) -> anyhow::Result<()>;
}

impl<J: TradeJournal + ?Sized> TradeJournal for Box<J> {
    fn record_trade(&mut self, trade: &TradeRecord) -> anyhow::Result<()> {
        (**self).record_trade(trade)
    }

    fn record_summary(&mut self, summary: &DailySummary) -> anyhow::Result<()> {
        (**self).record_summary(summary)
    }
}

/// Journal that drops everything (`--no-journal`)
#[derive(Debug, Default)]
pub struct NullJournal;

impl TradeJournal for NullJournal {
    fn record_trade(&mut self, _trade: &TradeRecord) -> anyhow::Result<()> {
        Ok(())
    }

    fn record_summary(&mut self, _summary: &DailySummary) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Append-only CSV trade log and daily summary log
///
/// Each file gets its header row only when it is created empty, so restarts
/// keep appending to the same log.
pub struct CsvJournal {
    trade_log: PathBuf,
    daily_summary: PathBuf,
}

impl CsvJournal {
    /// Create both files (with headers) if they do not exist yet
    pub fn open(
        trade_log: impl Into<PathBuf>,
        daily_summary: impl Into<PathBuf>,
    ) -> anyhow::Result<Self> {
        let journal = Self {
            trade_log: trade_log.into(),
            daily_summary: daily_summary.into(),
        };

        ensure_header(&journal.trade_log, &TRADE_HEADER)?;
        ensure_header(&journal.daily_summary, &SUMMARY_HEADER)?;

        tracing::info!(
            "Journaling trades to {} and summaries to {}",
            journal.trade_log.display(),
            journal.daily_summary.display()
        );

        Ok(journal)
    }

    pub fn trade_log(&self) -> &Path {
        &self.trade_log
    }

    pub fn daily_summary(&self) -> &Path {
        &self.daily_summary
    }
}

impl TradeJournal for CsvJournal {
    fn record_trade(&mut self, trade: &TradeRecord) -> anyhow::Result<()> {
        append_row(
            &self.trade_log,
            &[
                trade.entry_time.format(TIME_FORMAT).to_string(),
                trade.exit_time.format(TIME_FORMAT).to_string(),
                trade.direction.label().to_string(),
                trade.entry_price.to_string(),
                trade.exit_price.to_string(),
                trade.quantity.to_string(),
                trade.profit.to_string(),
                trade.entry_rsi.to_string(),
                trade.exit_rsi.to_string(),
                format!("{:.2}", trade.duration_minutes),
            ],
        )
    }

    fn record_summary(&mut self, summary: &DailySummary) -> anyhow::Result<()> {
        append_row(
            &self.daily_summary,
            &[
                summary.date.format("%Y-%m-%d").to_string(),
                summary.total_trades.to_string(),
                summary.long_trades.to_string(),
                summary.short_trades.to_string(),
                format!("{:.2}", summary.total_profit),
                format!("{:.2}", summary.avg_profit),
                summary.winning_trades.to_string(),
                summary.losing_trades.to_string(),
            ],
        )
    }
}

fn open_append(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))
}

fn ensure_header(path: &Path, header: &[&str]) -> anyhow::Result<()> {
    let file = open_append(path)?;
    let empty = file
        .metadata()
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len()
        == 0;

    if empty {
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record(header)?;
        wtr.flush()?;
    }
    Ok(())
}

fn append_row(path: &Path, row: &[String]) -> anyhow::Result<()> {
    let file = open_append(path)?;
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    wtr.write_record(row)
        .with_context(|| format!("failed to append to {}", path.display()))?;
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: DateTime<Utc>,
    close: f64,
}

/// Load a `timestamp,close` CSV (RFC 3339 timestamps) for replay
pub fn load_bars(path: &Path) -> anyhow::Result<Vec<PriceSample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open bar file {}", path.display()))?;

    let mut bars = Vec::new();
    for (i, row) in rdr.deserialize::<BarRow>().enumerate() {
        // +2: header line and 1-based numbering
        let row = row.with_context(|| format!("bad bar on line {}", i + 2))?;
        bars.push(PriceSample::new(row.timestamp, row.close));
    }

    tracing::info!("Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}
