//! # Seed Sequence
//!
//! Deterministic integer draws keyed by draw index.
//!
//! Every draw re-seeds a fresh generator from the running value and then bumps the running
//! value by one, so draw `n` of a run depends only on `initial_seed + n`. Room choices are
//! therefore reproducible per draw without carrying full generator state around.

use log::error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Running-seed draw sequence for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSequence {
    initial_seed: u32,
    running_seed: u32,
}

impl SeedSequence {
    /// Starts a sequence at `seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use portalcrawl::SeedSequence;
    ///
    /// let mut a = SeedSequence::new(7);
    /// let mut b = SeedSequence::new(7);
    /// assert_eq!(a.next(0, 100), b.next(0, 100));
    /// assert_eq!(a.draws(), 1);
    /// ```
    pub fn new(seed: u32) -> Self {
        Self {
            initial_seed: seed,
            running_seed: seed,
        }
    }

    /// Rewinds to the initial seed.
    pub fn reset(&mut self) {
        self.running_seed = self.initial_seed;
    }

    /// Restarts at a new seed.
    pub fn reseed(&mut self, seed: u32) {
        self.initial_seed = seed;
        self.running_seed = seed;
    }

    pub fn initial_seed(&self) -> u32 {
        self.initial_seed
    }

    /// Number of draws consumed since the last reset.
    pub fn draws(&self) -> u32 {
        self.running_seed.wrapping_sub(self.initial_seed)
    }

    /// Draws an integer in `[min, max]`.
    ///
    /// An empty or single-value range is rejected: it logs an error, returns 0, and does not
    /// consume a draw.
    pub fn next(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            error!("invalid draw range: min {} is not below max {}", min, max);
            return 0;
        }
        let mut rng = StdRng::seed_from_u64(u64::from(self.running_seed));
        self.running_seed = self.running_seed.wrapping_add(1);
        rng.gen_range(min..=max)
    }

    /// Draws an index into a collection of `len` items.
    ///
    /// A single-item collection yields 0 without drawing, like any empty range. Empty
    /// collections yield `None`.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        match len {
            0 => None,
            1 => Some(0),
            _ => {
                let max = u32::try_from(len - 1).unwrap_or(u32::MAX);
                Some(self.next(0, max) as usize)
            }
        }
    }
}
