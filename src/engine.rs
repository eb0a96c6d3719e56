use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::EngineError;
use crate::execution::{OrderExecutor, OrderRequest};
use crate::indicators::RsiTracker;
use crate::models::{Decision, PriceSample, Side, TradeRecord};
use crate::strategy::{ExitThreshold, PositionMachine, RandomExit, StrategyConfig};
use crate::summary::DailySummary;

/// Outcome of one processed sample
#[derive(Debug, Clone, Serialize)]
pub struct BarReport {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub rsi: f64,
    /// Side after the bar's transition (if any) was committed
    pub side: Side,
    /// Decision that was executed and committed on this bar
    pub decision: Option<Decision>,
    /// Trade completed on this bar
    pub trade: Option<TradeRecord>,
}

/// Single-instrument RSI decision engine
///
/// Owns the oscillator, the position state machine and the executor. Every
/// method takes `&mut self`: one caller drives it, one bar at a time, and a
/// bar is finished (execution round trip included) before the next starts.
pub struct Engine<X, T = RandomExit> {
    symbol: String,
    tracker: RsiTracker,
    machine: PositionMachine<T>,
    executor: X,
    prev_rsi: Option<f64>,
    last_timestamp: Option<DateTime<Utc>>,
    trades: Vec<TradeRecord>,
}

impl<X: OrderExecutor, T: ExitThreshold> Engine<X, T> {
    /// Fails on invalid strategy thresholds or a non-positive quantity
    pub fn new(
        symbol: impl Into<String>,
        config: StrategyConfig,
        quantity: f64,
        executor: X,
        exit_source: T,
    ) -> anyhow::Result<Self> {
        let tracker = RsiTracker::new(config.rsi_period);
        let machine = PositionMachine::new(config, quantity, exit_source)?;

        Ok(Self {
            symbol: symbol.into(),
            tracker,
            machine,
            executor,
            prev_rsi: None,
            last_timestamp: None,
            trades: Vec::new(),
        })
    }

    /// Process the next sample: update RSI, decide, execute, commit
    ///
    /// Invalid input is rejected before any state changes. A failed execution
    /// or a fill with a bad price or a quantity other than the order's
    /// rolls the pending transition back and is returned as
    /// [`EngineError::Execution`]; the bar's RSI reading is kept.
    pub async fn on_sample(&mut self, sample: &PriceSample) -> Result<BarReport, EngineError> {
        self.validate(sample)?;

        let side_before = self.machine.side();
        let prev_rsi = self.prev_rsi;
        let rsi = self.tracker.update(sample.close);
        self.prev_rsi = Some(rsi);
        self.last_timestamp = Some(sample.timestamp);

        tracing::info!(
            "{} | {:7.2} | {:6.2} | {:8}",
            sample.timestamp.format("%H:%M:%S"),
            sample.close,
            rsi,
            side_before.as_str()
        );

        let mut committed = None;
        let mut trade = None;

        let decision = self
            .machine
            .on_bar(prev_rsi, rsi, sample.close, sample.timestamp);

        if let Some(decision) = decision {
            let order = OrderRequest {
                symbol: self.symbol.clone(),
                side: decision.order_side(),
                quantity: self.machine.quantity(),
                reference_price: sample.close,
            };

            tracing::debug!(
                "Sending {:?} {} {} via {}",
                order.side,
                order.quantity,
                order.symbol,
                self.executor.name()
            );

            let result = self
                .executor
                .execute(&order)
                .await
                .and_then(|fill| fill.check(&order).map(|()| fill));

            match result {
                Ok(fill) => {
                    trade = self.machine.confirm_fill(&decision, fill.avg_price);
                    committed = Some(decision);
                    if let Some(record) = &trade {
                        self.trades.push(record.clone());
                    }
                }
                Err(source) => {
                    tracing::debug!("{} executor failed: {}", self.executor.name(), source);
                    self.machine.reject(&decision);
                    return Err(EngineError::Execution { decision, source });
                }
            }
        }

        Ok(BarReport {
            timestamp: sample.timestamp,
            price: sample.close,
            rsi,
            side: self.machine.side(),
            decision: committed,
            trade,
        })
    }

    fn validate(&self, sample: &PriceSample) -> Result<(), EngineError> {
        if !sample.close.is_finite() || sample.close <= 0.0 {
            return Err(EngineError::InvalidPrice(sample.close));
        }

        if let Some(last) = self.last_timestamp {
            if sample.timestamp < last {
                return Err(EngineError::OutOfOrder {
                    last,
                    got: sample.timestamp,
                });
            }
        }

        Ok(())
    }

    /// Start a new trading session: forget RSI history and position state.
    /// Completed trades are kept.
    pub fn reset_session(&mut self) -> Result<(), EngineError> {
        let side = self.machine.side();
        if side != Side::Flat {
            return Err(EngineError::SessionBusy(side.as_str()));
        }

        self.tracker.reset();
        self.machine.reset();
        self.prev_rsi = None;
        self.last_timestamp = None;

        tracing::info!("Session reset for {}", self.symbol);
        Ok(())
    }

    /// Copy of the completed trades, safe to aggregate while the engine runs
    pub fn trade_history(&self) -> Vec<TradeRecord> {
        self.trades.clone()
    }

    pub fn daily_summary(&self, date: NaiveDate) -> Option<DailySummary> {
        DailySummary::from_trades(date, &self.trade_history())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.machine.side()
    }

    pub fn rsi(&self) -> f64 {
        self.tracker.value()
    }

    pub fn quantity(&self) -> f64 {
        self.machine.quantity()
    }

    pub fn machine(&self) -> &PositionMachine<T> {
        &self.machine
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }
}
