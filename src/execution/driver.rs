//! Progress drivers.
//!
//! The engine asks its driver how far to advance the current node on each
//! step. Production runs use randomized increments; tests use a fixed step
//! so runs are deterministic.

use crate::pipeline::id::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest increment the engine will apply, keeping progress strictly
/// increasing whatever the driver returns.
pub const MIN_INCREMENT: f64 = 0.1;

/// Largest increment; a single step can finish a node.
pub const MAX_INCREMENT: f64 = 100.0;

pub trait ProgressDriver: Send {
    /// Amount to add to `current` for `node`.
    fn next_increment(&mut self, node: &NodeId, current: f64) -> f64;
}

/// Uniformly random increments in `[min, max]`.
pub struct RandomProgress {
    min: f64,
    max: f64,
    rng: StdRng,
}

impl RandomProgress {
    pub fn new(min: f64, max: f64) -> Self {
        Self::with_rng(min, max, StdRng::from_os_rng())
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(min: f64, max: f64, seed: u64) -> Self {
        Self::with_rng(min, max, StdRng::seed_from_u64(seed))
    }

    fn with_rng(min: f64, max: f64, rng: StdRng) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: min.max(MIN_INCREMENT),
            max: max.clamp(MIN_INCREMENT, MAX_INCREMENT),
            rng,
        }
    }
}

impl ProgressDriver for RandomProgress {
    fn next_increment(&mut self, _node: &NodeId, _current: f64) -> f64 {
        if self.min >= self.max {
            return self.max;
        }
        self.rng.random_range(self.min..=self.max)
    }
}

/// Constant increment.
#[derive(Debug, Clone, Copy)]
pub struct FixedStep(pub f64);

impl ProgressDriver for FixedStep {
    fn next_increment(&mut self, _node: &NodeId, _current: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_progress_within_bounds() {
        let mut driver = RandomProgress::seeded(5.0, 20.0, 7);
        let node = NodeId::new("n");
        for _ in 0..500 {
            let step = driver.next_increment(&node, 0.0);
            assert!((5.0..=20.0).contains(&step), "step {step} out of range");
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let node = NodeId::new("n");
        let mut a = RandomProgress::seeded(1.0, 50.0, 42);
        let mut b = RandomProgress::seeded(1.0, 50.0, 42);
        for _ in 0..20 {
            assert_eq!(a.next_increment(&node, 0.0), b.next_increment(&node, 0.0));
        }
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let mut driver = RandomProgress::seeded(30.0, 10.0, 1);
        let step = driver.next_increment(&NodeId::new("n"), 0.0);
        assert!((10.0..=30.0).contains(&step));
    }
}
