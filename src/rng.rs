//! Random number source handed to backends.
//!
//! The state layer never creates or seeds an engine itself: the controller
//! owns one and lends it to `apply_ops` and `sample_measure` by `&mut`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable random engine.
#[derive(Debug, Clone)]
pub struct RngEngine {
    rng: StdRng,
}

impl RngEngine {
    /// Create an engine seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a reproducible engine.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform sample from `[0, 1)`.
    pub fn rand(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }

    /// Uniform sample from `[low, high)`.
    pub fn rand_range(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    /// Sample an index with probability proportional to `weights[index]`.
    ///
    /// Weights need not be normalized. Falls back to the last index when
    /// rounding leaves the cumulative sum short of the draw. Returns `None`
    /// for an empty slice.
    pub fn rand_int(&mut self, weights: &[f64]) -> Option<usize> {
        let last = weights.len().checked_sub(1)?;
        let total: f64 = weights.iter().sum();
        let draw = self.rand() * total;
        let mut cumulative = 0.0;
        for (index, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if draw < cumulative {
                return Some(index);
            }
        }
        Some(last)
    }

    /// Underlying generator, for backends that need other distributions.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for RngEngine {
    fn default() -> Self {
        Self::new()
    }
}
