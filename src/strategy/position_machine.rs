use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::exit_band::{ExitThreshold, RandomExit};
use super::StrategyConfig;
use crate::models::{Action, Decision, Direction, OpenTrade, Side, TradeRecord};

/// Flat / Long / Short state machine driven by RSI readings
///
/// Transitions are two-phase: [`on_bar`](Self::on_bar) only proposes a
/// decision and parks it as pending. The side changes when the caller reports
/// the fill through [`confirm_fill`](Self::confirm_fill); a failed execution
/// is reported through [`reject`](Self::reject) and leaves everything as it
/// was before the bar.
pub struct PositionMachine<T = RandomExit> {
    config: StrategyConfig,
    quantity: f64,
    exit_source: T,
    side: Side,
    open_trade: Option<OpenTrade>,
    pending: Option<Decision>,
    last_exit_threshold: Option<f64>,
}

impl<T: ExitThreshold> PositionMachine<T> {
    /// Fails if the thresholds are invalid or `quantity` is not positive
    pub fn new(config: StrategyConfig, quantity: f64, exit_source: T) -> anyhow::Result<Self> {
        config.validate()?;
        if !(quantity.is_finite() && quantity > 0.0) {
            anyhow::bail!("quantity must be positive, got {}", quantity);
        }

        Ok(Self {
            config,
            quantity,
            exit_source,
            side: Side::Flat,
            open_trade: None,
            pending: None,
            last_exit_threshold: None,
        })
    }

    /// Evaluate one bar
    ///
    /// In a position only the exit rule is checked; when flat only the entry
    /// rules are. A bar that starts in a position can therefore never also
    /// produce an entry. Entries need a previous reading.
    pub fn on_bar(
        &mut self,
        prev_rsi: Option<f64>,
        curr_rsi: f64,
        price: f64,
        now: DateTime<Utc>,
    ) -> Option<Decision> {
        if let Some(stale) = self.pending.take() {
            tracing::warn!(
                "Dropping unconfirmed {:?} from {} before evaluating new bar",
                stale.action,
                stale.timestamp
            );
        }

        let action = match self.side {
            Side::Flat => prev_rsi.and_then(|prev| self.entry_action(prev, curr_rsi)),
            Side::Long => self.exit_action(Direction::Long, curr_rsi),
            Side::Short => self.exit_action(Direction::Short, curr_rsi),
        };

        let decision = action.map(|action| Decision {
            action,
            rsi: curr_rsi,
            price,
            timestamp: now,
        });
        self.pending = decision;
        decision
    }

    fn entry_action(&self, prev_rsi: f64, curr_rsi: f64) -> Option<Action> {
        if prev_rsi < self.config.long_trigger && curr_rsi >= self.config.long_entry {
            Some(Action::EnterLong)
        } else if prev_rsi > self.config.short_trigger && curr_rsi >= self.config.short_entry {
            // Same comparison direction as the long side on purpose
            Some(Action::EnterShort)
        } else {
            None
        }
    }

    fn exit_action(&mut self, direction: Direction, curr_rsi: f64) -> Option<Action> {
        let (min, max) = (self.config.exit_min, self.config.exit_max);
        let threshold = self.exit_source.draw(min, max).max(min).min(max);
        self.last_exit_threshold = Some(threshold);

        let hit = match direction {
            Direction::Long => curr_rsi >= threshold,
            Direction::Short => curr_rsi <= threshold,
        };
        hit.then_some(Action::Exit(direction))
    }

    /// Commit the pending decision at the confirmed fill price
    ///
    /// Returns the completed trade when the decision was an exit. A decision
    /// that is not the pending one is ignored.
    pub fn confirm_fill(&mut self, decision: &Decision, fill_price: f64) -> Option<TradeRecord> {
        if self.pending.as_ref() != Some(decision) {
            tracing::warn!("Ignoring fill for {:?}: not the pending decision", decision.action);
            return None;
        }
        self.pending = None;

        let completed = match decision.action {
            Action::EnterLong => {
                self.open(Direction::Long, decision, fill_price);
                None
            }
            Action::EnterShort => {
                self.open(Direction::Short, decision, fill_price);
                None
            }
            Action::Exit(_) => self.close(decision, fill_price),
        };

        debug_assert!(self.is_consistent());
        completed
    }

    /// Discard the pending decision after a failed execution
    ///
    /// Returns false if `decision` was not pending.
    pub fn reject(&mut self, decision: &Decision) -> bool {
        if self.pending.as_ref() != Some(decision) {
            return false;
        }
        self.pending = None;
        tracing::warn!(
            "Execution not confirmed for {:?}, staying {}",
            decision.action,
            self.side.as_str()
        );
        true
    }

    fn open(&mut self, direction: Direction, decision: &Decision, fill_price: f64) {
        tracing::info!(
            "ENTER {}: Price={:.2}, RSI={:.2}",
            direction.label(),
            fill_price,
            decision.rsi
        );

        self.open_trade = Some(OpenTrade {
            id: Uuid::new_v4(),
            direction,
            entry_time: decision.timestamp,
            entry_price: fill_price,
            entry_rsi: decision.rsi,
            quantity: self.quantity,
        });
        self.side = direction.side();
    }

    fn close(&mut self, decision: &Decision, fill_price: f64) -> Option<TradeRecord> {
        let Some(trade) = self.open_trade.take() else {
            tracing::warn!("Exit confirmed with no open trade");
            self.side = Side::Flat;
            return None;
        };

        let record = trade.close(decision.timestamp, fill_price, decision.rsi);
        self.side = Side::Flat;

        tracing::info!(
            "EXIT {}: Price={:.2}, RSI={:.2}, P&L=${:+.2}",
            record.direction.label(),
            fill_price,
            decision.rsi,
            record.profit
        );

        Some(record)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn open_trade(&self) -> Option<&OpenTrade> {
        self.open_trade.as_ref()
    }

    pub fn entry_price(&self) -> Option<f64> {
        self.open_trade.as_ref().map(|t| t.entry_price)
    }

    pub fn entry_time(&self) -> Option<DateTime<Utc>> {
        self.open_trade.as_ref().map(|t| t.entry_time)
    }

    pub fn entry_rsi(&self) -> Option<f64> {
        self.open_trade.as_ref().map(|t| t.entry_rsi)
    }

    pub fn pending(&self) -> Option<&Decision> {
        self.pending.as_ref()
    }

    /// Exit threshold drawn on the most recent in-position bar
    pub fn last_exit_threshold(&self) -> Option<f64> {
        self.last_exit_threshold
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Side and open trade agree: Flat has no trade, Long/Short have one in
    /// the same direction.
    pub fn is_consistent(&self) -> bool {
        match (&self.side, &self.open_trade) {
            (Side::Flat, None) => true,
            (Side::Long, Some(t)) => t.direction == Direction::Long,
            (Side::Short, Some(t)) => t.direction == Direction::Short,
            _ => false,
        }
    }

    /// Back to flat with nothing pending
    pub fn reset(&mut self) {
        self.side = Side::Flat;
        self.open_trade = None;
        self.pending = None;
        self.last_exit_threshold = None;
    }
}
