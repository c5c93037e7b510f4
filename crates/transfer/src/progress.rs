//! Simulated upload progress.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Rounds to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Bounds of a single random progress increment, in percentage points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncrementRange {
    pub min: f64,
    pub max: f64,
}

const DEFAULT_MIN_INCREMENT: f64 = 2.0;
const DEFAULT_MAX_INCREMENT: f64 = 15.0;

impl IncrementRange {
    /// Creates a range. Reversed bounds are swapped and both are clamped to
    /// `0.1..=100`; a bound that is not a finite number takes its default.
    pub fn new(min: f64, max: f64) -> Self {
        let min = finite_or(min, DEFAULT_MIN_INCREMENT);
        let max = finite_or(max, DEFAULT_MAX_INCREMENT);
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: lo.clamp(0.1, 100.0),
            max: hi.clamp(0.1, 100.0),
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

impl Default for IncrementRange {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INCREMENT, DEFAULT_MAX_INCREMENT)
    }
}

/// Iterator over the progress values of one simulated upload.
///
/// Each item is the previous value plus a random increment in the
/// configured range, rounded to one decimal and capped so the last item is
/// exactly `100.0`. The sequence is strictly increasing.
pub struct ProgressSteps<R = StdRng> {
    current: f64,
    range: IncrementRange,
    rng: R,
}

impl ProgressSteps<StdRng> {
    /// Creates a sequence seeded from OS randomness.
    pub fn new(range: IncrementRange) -> Self {
        Self::with_rng(range, StdRng::from_os_rng())
    }
}

impl<R: Rng> ProgressSteps<R> {
    pub fn with_rng(range: IncrementRange, rng: R) -> Self {
        Self {
            current: 0.0,
            range,
            rng,
        }
    }

    /// Last value produced (0 before the first step).
    pub fn current(&self) -> f64 {
        self.current
    }
}

impl<R: Rng> Iterator for ProgressSteps<R> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.current >= 100.0 {
            return None;
        }
        let IncrementRange { min, max } = self.range;
        let increment = round_one_decimal(self.rng.random_range(min..=max));
        self.current = round_one_decimal((self.current + increment).min(100.0));
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> ProgressSteps<StdRng> {
        ProgressSteps::with_rng(IncrementRange::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn rounding() {
        assert_eq!(round_one_decimal(12.34), 12.3);
        assert_eq!(round_one_decimal(12.35), 12.4);
        assert_eq!(round_one_decimal(100.0), 100.0);
    }

    #[test]
    fn ends_exactly_at_hundred() {
        for seed in 0..50 {
            let steps: Vec<f64> = seeded(seed).collect();
            assert_eq!(*steps.last().unwrap(), 100.0);
        }
    }

    #[test]
    fn strictly_increasing_within_bounds() {
        for seed in 0..50 {
            let mut last = 0.0;
            for value in seeded(seed) {
                let step = round_one_decimal(value - last);
                assert!(value > last);
                assert!(step <= 15.0, "step {step} too large");
                if value < 100.0 {
                    assert!(step >= 2.0, "step {step} too small");
                }
                assert_eq!(round_one_decimal(value), value);
                last = value;
            }
        }
    }

    #[test]
    fn step_count_is_bounded() {
        // 100 / 15 rounds up to 7, 100 / 2 is 50.
        for seed in 0..50 {
            let n = seeded(seed).count();
            assert!((7..=50).contains(&n), "{n} steps");
        }
    }

    #[test]
    fn exhausted_iterator_stays_exhausted() {
        let mut steps = seeded(1);
        while steps.next().is_some() {}
        assert_eq!(steps.current(), 100.0);
        assert!(steps.next().is_none());
    }

    #[test]
    fn reversed_range_is_normalised() {
        let r = IncrementRange::new(15.0, 2.0);
        assert_eq!(r, IncrementRange::new(2.0, 15.0));
    }

    #[test]
    fn non_finite_bounds_fall_back_to_defaults() {
        let nan = IncrementRange::new(f64::NAN, f64::NAN);
        assert_eq!(nan, IncrementRange::default());
        let inf = IncrementRange::new(5.0, f64::INFINITY);
        assert_eq!(inf, IncrementRange::new(5.0, 15.0));
        let neg_inf = IncrementRange::new(f64::NEG_INFINITY, 8.0);
        assert_eq!(neg_inf, IncrementRange::new(2.0, 8.0));

        let range = IncrementRange::new(f64::NAN, f64::INFINITY);
        let mut steps = ProgressSteps::with_rng(range, StdRng::seed_from_u64(3));
        assert_eq!(steps.by_ref().last(), Some(100.0));
    }

    #[test]
    fn huge_bounds_are_capped() {
        let range = IncrementRange::new(500.0, f64::MAX);
        assert_eq!(range.min, 100.0);
        assert_eq!(range.max, 100.0);
        let mut steps = ProgressSteps::with_rng(range, StdRng::seed_from_u64(9));
        assert_eq!(steps.next(), Some(100.0));
        assert_eq!(steps.next(), None);
    }
}
