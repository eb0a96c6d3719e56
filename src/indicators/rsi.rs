/// RSI reported while there is not enough history to compute one
pub const NEUTRAL_RSI: f64 = 50.0;

/// Calculate Wilder's Relative Strength Index over the full price history
///
/// The first `period` deltas seed the average gain/loss as a simple mean;
/// every later delta is folded in with Wilder smoothing (factor 1/period).
///
/// Values:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// Returns [`NEUTRAL_RSI`] when fewer than `period + 1` prices are given.
pub fn calculate_rsi(prices: &[f64], period: usize) -> f64 {
    let period = period.max(1);
    if prices.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);

    // Calculate price changes
    for i in 1..prices.len() {
        let (gain, loss) = split_change(prices[i] - prices[i - 1]);
        gains.push(gain);
        losses.push(loss);
    }

    let n = period as f64;
    let mut avg_gain = gains[..period].iter().fold(0.0, |acc, g| acc + g) / n;
    let mut avg_loss = losses[..period].iter().fold(0.0, |acc, l| acc + l) / n;

    for i in period..gains.len() {
        avg_gain = wilder(avg_gain, gains[i], n);
        avg_loss = wilder(avg_loss, losses[i], n);
    }

    rsi_from_averages(avg_gain, avg_loss)
}

/// Streaming RSI that yields the same sequence as [`calculate_rsi`] over the
/// growing history, in constant memory.
#[derive(Debug, Clone)]
pub struct RsiTracker {
    period: usize,
    last_close: Option<f64>,
    seed_gain: f64,
    seed_loss: f64,
    avg_gain: f64,
    avg_loss: f64,
    sample_count: usize,
    value: f64,
}

impl RsiTracker {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            last_close: None,
            seed_gain: 0.0,
            seed_loss: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            sample_count: 0,
            value: NEUTRAL_RSI,
        }
    }

    /// Feed the next close and return the current RSI
    pub fn update(&mut self, close: f64) -> f64 {
        self.sample_count += 1;

        if let Some(prev) = self.last_close {
            let (gain, loss) = split_change(close - prev);
            let deltas_seen = self.sample_count - 1;
            let n = self.period as f64;

            if deltas_seen <= self.period {
                self.seed_gain += gain;
                self.seed_loss += loss;
                if deltas_seen == self.period {
                    self.avg_gain = self.seed_gain / n;
                    self.avg_loss = self.seed_loss / n;
                }
            } else {
                self.avg_gain = wilder(self.avg_gain, gain, n);
                self.avg_loss = wilder(self.avg_loss, loss, n);
            }
        }
        self.last_close = Some(close);

        self.value = if self.is_primed() {
            rsi_from_averages(self.avg_gain, self.avg_loss)
        } else {
            NEUTRAL_RSI
        };
        self.value
    }

    /// Last reported RSI
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// True once `period + 1` closes have been observed
    pub fn is_primed(&self) -> bool {
        self.sample_count > self.period
    }

    pub fn averages(&self) -> (f64, f64) {
        (self.avg_gain, self.avg_loss)
    }

    /// Forget all history (new trading session)
    pub fn reset(&mut self) {
        *self = Self::new(self.period);
    }
}

fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

fn wilder(avg: f64, value: f64, n: f64) -> f64 {
    (avg * (n - 1.0) + value) / n
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_calculation() {
        // Test with known values
        let prices = vec![
            44.0, 44.25, 44.5, 43.75, 44.0, 44.5, 45.0, 45.5, 45.25, 45.5, 46.0, 46.5, 46.25,
            46.0, 46.5,
        ];

        let rsi = calculate_rsi(&prices, 14);
        assert!(rsi > 0.0 && rsi < 100.0);

        // 4.0 total gain vs 1.5 total loss over the seed window
        let expected = 100.0 - 100.0 / (1.0 + 4.0 / 1.5);
        assert!((rsi - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let prices = vec![100.0, 102.0, 101.0];
        assert_eq!(calculate_rsi(&prices, 14), NEUTRAL_RSI);
    }

    #[test]
    fn test_rsi_all_gains() {
        let prices = vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        assert_eq!(calculate_rsi(&prices, 5), 100.0); // All gains = RSI 100
    }

    #[test]
    fn test_rsi_all_losses() {
        let prices = vec![105.0, 104.0, 103.0, 102.0, 101.0, 100.0];
        assert_eq!(calculate_rsi(&prices, 5), 0.0);
    }

    #[test]
    fn test_wilder_smoothing_after_seed() {
        // period 2: seed deltas +2, -1 -> avg_gain 1.0, avg_loss 0.5
        // then +1 -> avg_gain 1.0, avg_loss 0.25
        let prices = vec![10.0, 12.0, 11.0, 12.0];
        let expected = 100.0 - 100.0 / (1.0 + 1.0 / 0.25);
        assert!((calculate_rsi(&prices, 2) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tracker_flat_prices() {
        let mut tracker = RsiTracker::new(14);
        for i in 0..15 {
            let rsi = tracker.update(100.0);
            if i < 14 {
                assert_eq!(rsi, 50.0);
            } else {
                assert_eq!(rsi, 100.0);
            }
        }
        assert!(tracker.is_primed());
    }

    #[test]
    fn test_tracker_matches_full_history() {
        let prices = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64, 46.21, 46.25, 45.71, 46.45,
        ];

        let mut tracker = RsiTracker::new(14);
        for i in 0..prices.len() {
            let incremental = tracker.update(prices[i]);
            let full = calculate_rsi(&prices[..=i], 14);
            assert!(
                (incremental - full).abs() < 1e-9,
                "mismatch at sample {}: {} vs {}",
                i + 1,
                incremental,
                full
            );
        }
    }

    #[test]
    fn test_tracker_reset() {
        let mut tracker = RsiTracker::new(3);
        for p in [1.0, 2.0, 3.0, 4.0, 5.0] {
            tracker.update(p);
        }
        assert!(tracker.is_primed());

        tracker.reset();
        assert_eq!(tracker.sample_count(), 0);
        assert_eq!(tracker.value(), NEUTRAL_RSI);
        assert_eq!(tracker.update(10.0), NEUTRAL_RSI);
    }
}
