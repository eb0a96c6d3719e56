use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use super::OrderExecutor;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::models::PriceSample;
use crate::persistence::TradeJournal;
use crate::strategy::ExitThreshold;

/// Counters for one feed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedStats {
    pub bars: usize,
    pub rejected_samples: usize,
    pub failed_executions: usize,
    pub trades: usize,
    pub summaries: usize,
}

/// Drives an [`Engine`] from a channel of samples
///
/// The driver is the engine's only caller. It pulls one sample, awaits the
/// whole bar (execution round trip included) and only then pulls the next,
/// so no two bars ever interleave. Completed trades go to the journal.
///
/// A day's summary is first written by the first sample at or after
/// `summary_time` (UTC). When the day rolls over, or on shutdown, it is
/// written again if trades closed after that row, so the last row for a date
/// always matches the engine's trade history.
pub struct FeedDriver<J> {
    journal: J,
    summary_time: NaiveTime,
    /// Date and trade count of the last summary row written
    last_summary: Option<(NaiveDate, usize)>,
    last_seen: Option<DateTime<Utc>>,
    stats: FeedStats,
}

impl<J: TradeJournal> FeedDriver<J> {
    pub fn new(journal: J, summary_time: NaiveTime) -> Self {
        Self {
            journal,
            summary_time,
            last_summary: None,
            last_seen: None,
            stats: FeedStats::default(),
        }
    }

    /// Process samples until the channel closes
    pub async fn run<X, T>(
        &mut self,
        engine: &mut Engine<X, T>,
        rx: &mut mpsc::Receiver<PriceSample>,
    )
    where
        X: OrderExecutor,
        T: ExitThreshold,
    {
        self.run_until(engine, rx, std::future::pending()).await
    }

    /// Process samples until the channel closes or `shutdown` completes
    ///
    /// Shutdown is only observed between bars. A bar whose order is in
    /// flight is always finished and committed first.
    pub async fn run_until<X, T, F>(
        &mut self,
        engine: &mut Engine<X, T>,
        rx: &mut mpsc::Receiver<PriceSample>,
        shutdown: F,
    )
    where
        X: OrderExecutor,
        T: ExitThreshold,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let sample = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested after {} bars", self.stats.bars);
                    return;
                }
                sample = rx.recv() => sample,
            };

            match sample {
                Some(sample) => self.process(engine, &sample).await,
                None => break,
            }
        }
        tracing::info!("Bar feed closed after {} bars", self.stats.bars);
    }

    /// Process a single sample. Failures are logged and counted, never fatal.
    pub async fn process<X, T>(&mut self, engine: &mut Engine<X, T>, sample: &PriceSample)
    where
        X: OrderExecutor,
        T: ExitThreshold,
    {
        self.stats.bars += 1;

        match engine.on_sample(sample).await {
            Ok(report) => {
                if let Some(trade) = &report.trade {
                    self.stats.trades += 1;
                    if let Err(e) = self.journal.record_trade(trade) {
                        tracing::error!("Failed to journal trade {}: {:#}", trade.id, e);
                    }
                }
            }
            Err(e @ EngineError::Execution { .. }) => {
                self.stats.failed_executions += 1;
                tracing::warn!("{}", e);
            }
            Err(e) => {
                self.stats.rejected_samples += 1;
                tracing::warn!("Skipping sample: {}", e);
                return;
            }
        }

        let date = sample.timestamp.date_naive();
        if let Some(prev) = self.last_seen.map(|t| t.date_naive()) {
            if prev != date {
                self.write_summary(engine, prev);
            }
        }
        self.last_seen = Some(sample.timestamp);

        let written_today = matches!(self.last_summary, Some((d, _)) if d == date);
        if !written_today && sample.timestamp.time() >= self.summary_time {
            self.write_summary(engine, date);
        }
    }

    /// Write the summary for the last processed day unless the row already
    /// written covers all of its trades. Called on shutdown.
    pub fn finish<X, T>(&mut self, engine: &Engine<X, T>) -> &FeedStats
    where
        X: OrderExecutor,
        T: ExitThreshold,
    {
        if let Some(last) = self.last_seen {
            self.write_summary(engine, last.date_naive());
        }
        &self.stats
    }

    fn write_summary<X, T>(&mut self, engine: &Engine<X, T>, date: NaiveDate)
    where
        X: OrderExecutor,
        T: ExitThreshold,
    {
        let Some(summary) = engine.daily_summary(date) else {
            return;
        };
        if self.last_summary == Some((date, summary.total_trades)) {
            return;
        }
        self.last_summary = Some((date, summary.total_trades));
        self.stats.summaries += 1;

        tracing::info!(
            "Daily Summary for {}: Trades: {} (Long: {}, Short: {}), Total Profit: ${:.2}, Win Rate: {}/{}",
            date,
            summary.total_trades,
            summary.long_trades,
            summary.short_trades,
            summary.total_profit,
            summary.winning_trades,
            summary.total_trades
        );

        if let Err(e) = self.journal.record_summary(&summary) {
            tracing::error!("Failed to journal daily summary for {}: {:#}", date, e);
        }
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    pub fn journal(&self) -> &J {
        &self.journal
    }
}

/// Push recorded bars into the driver's channel, optionally pacing them
///
/// The bounded channel provides backpressure: the task waits while the
/// engine is still busy with earlier bars.
pub fn spawn_replay(
    bars: Vec<PriceSample>,
    tx: mpsc::Sender<PriceSample>,
    pace: Option<Duration>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for bar in bars {
            if tx.send(bar).await.is_err() {
                tracing::debug!("Bar receiver dropped, stopping replay");
                break;
            }
            if let Some(pace) = pace {
                tokio::time::sleep(pace).await;
            }
        }
    })
}
