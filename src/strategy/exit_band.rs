use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the per-bar exit threshold
pub trait ExitThreshold {
    /// Draw a threshold in `[min, max]`
    fn draw(&mut self, min: f64, max: f64) -> f64;
}

/// Uniform draws from a seedable RNG
#[derive(Debug, Clone)]
pub struct RandomExit<R = StdRng> {
    rng: R,
}

impl<R: Rng> RandomExit<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomExit<StdRng> {
    /// Reproducible draws
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> ExitThreshold for RandomExit<R> {
    fn draw(&mut self, min: f64, max: f64) -> f64 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Always returns the same threshold
#[derive(Debug, Clone, Copy)]
pub struct FixedExit(pub f64);

impl ExitThreshold for FixedExit {
    fn draw(&mut self, _min: f64, _max: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_draws_stay_in_band() {
        let mut source = RandomExit::seeded(42);
        for _ in 0..10_000 {
            let draw = source.draw(48.0, 52.0);
            assert!((48.0..=52.0).contains(&draw));
        }
    }

    #[test]
    fn test_seeded_draws_are_reproducible() {
        let mut a = RandomExit::seeded(7);
        let mut b = RandomExit::seeded(7);
        for _ in 0..100 {
            assert_eq!(a.draw(48.0, 52.0), b.draw(48.0, 52.0));
        }
    }

    #[test]
    fn test_degenerate_band() {
        let mut source = RandomExit::seeded(1);
        assert_eq!(source.draw(50.0, 50.0), 50.0);
    }
}
