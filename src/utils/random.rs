//! Random sampling utilities.
//!
//! All randomness in the library flows through seeded [`RandomSampler`]s so
//! that indices, initial centroids and reseeds are reproducible.

use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::seq::SliceRandom;
use rand_distr::StandardNormal;

/// Seeded random sampler.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// Create a new sampler with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Sample k unique indices from [0, n).
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        if k >= n {
            return (0..n).collect();
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.partial_shuffle(&mut self.rng, k);
        indices.truncate(k);
        indices
    }

    /// All indices of [0, n) in random order.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);
        indices
    }

    /// Draw an index with probability proportional to `weights[i]`.
    ///
    /// Returns `None` when the weights are empty, negative or sum to zero.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        WeightedIndex::new(weights).ok().map(|dist| dist.sample(&mut self.rng))
    }

    /// Get a random index in [0, n).
    pub fn random_index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Get a random float in [low, high).
    pub fn random_range(&mut self, low: f32, high: f32) -> f32 {
        self.rng.gen_range(low..high)
    }

    /// Draw a vector of `dim` standard normal components.
    pub fn standard_normal_vec(&mut self, dim: usize) -> Vec<f32> {
        (0..dim).map(|_| self.rng.sample(StandardNormal)).collect()
    }

    /// Get a random integer in [low, high).
    pub fn random_u64(&mut self, low: u64, high: u64) -> u64 {
        self.rng.gen_range(low..high)
    }
}
