//! Random projection hash functions.
//!
//! A [`HashFunction`] projects a vector onto a random Gaussian direction,
//! shifts it by a random offset in `[0, w)` and either quantizes the result
//! into buckets of width `w` (amplified hashing) or keeps its sign
//! (hypercube hashing).

use crate::data_format::RecordCollection;
use crate::distance_measures::{dot_product, squared_l2};
use crate::utils::parallel::maybe_parallel_map_threshold;
use crate::utils::random::RandomSampler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of records sampled when estimating a bucket width.
pub const BUCKET_WIDTH_SAMPLE_SIZE: usize = 100;

/// Bucket width as a multiple of the mean nearest-neighbor distance.
pub const BUCKET_WIDTH_MULTIPLIER: f32 = 4.0;

/// A single random projection `h(x) = floor((v . x + t) / w)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HashFunction {
    projection: Vec<f32>,
    offset: f32,
    bucket_width: f32,
}

impl HashFunction {
    /// Create a hash function from explicit parameters.
    pub fn new(projection: Vec<f32>, offset: f32, bucket_width: f32) -> Self {
        debug_assert!(bucket_width > 0.0);
        Self {
            projection,
            offset,
            bucket_width,
        }
    }

    /// Draw a random hash function of dimension `dim`.
    pub fn random(dim: usize, bucket_width: f32, sampler: &mut RandomSampler) -> Self {
        let projection = sampler.standard_normal_vec(dim);
        let offset = sampler.random_range(0.0, bucket_width);
        Self::new(projection, offset, bucket_width)
    }

    /// Projection direction.
    pub fn projection(&self) -> &[f32] {
        &self.projection
    }

    /// Random shift in `[0, bucket_width)`.
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Bucket width `w`.
    pub fn bucket_width(&self) -> f32 {
        self.bucket_width
    }

    /// Shifted projection `v . x + t`.
    #[inline]
    pub fn project(&self, x: &[f32]) -> f32 {
        dot_product(&self.projection, x) + self.offset
    }

    /// Bucket number `floor((v . x + t) / w)`. May be negative.
    #[inline]
    pub fn bucket(&self, x: &[f32]) -> i64 {
        (self.project(x) / self.bucket_width).floor() as i64
    }

    /// Hypercube bit: which side of the shifted hyperplane `x` falls on.
    #[inline]
    pub fn bit(&self, x: &[f32]) -> bool {
        self.project(x) >= 0.0
    }
}

/// Deterministic source of hash functions for one index configuration.
///
/// Every member (one LSH table, or the whole hypercube) gets its own seed
/// derived from the family seed, so members are independent yet reproducible.
#[derive(Debug, Clone)]
pub struct HashFunctionFamily {
    dimensionality: usize,
    bucket_width: f32,
    seed: u64,
}

impl HashFunctionFamily {
    /// Create a family for vectors of dimension `dimensionality`.
    pub fn new(dimensionality: usize, bucket_width: f32, seed: u64) -> Self {
        Self {
            dimensionality,
            bucket_width,
            seed,
        }
    }

    /// Dimension of the generated projections.
    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    /// Bucket width of the generated functions.
    pub fn bucket_width(&self) -> f32 {
        self.bucket_width
    }

    /// Seed of the sampler used for `member`.
    ///
    /// Member `m` takes the `m`-th value drawn from a generator seeded with
    /// the family seed, so members are independent of each other.
    pub fn member_seed(&self, member: u64) -> u64 {
        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..member {
            rng.gen::<u64>();
        }
        rng.gen()
    }

    /// Sampler for `member`; also used to draw per-member coefficients.
    pub fn member_sampler(&self, member: u64) -> RandomSampler {
        RandomSampler::with_seed(self.member_seed(member))
    }

    /// Build `k` hash functions for `member`.
    pub fn build(&self, k: usize, member: u64) -> Vec<HashFunction> {
        let mut sampler = self.member_sampler(member);
        self.build_with(k, &mut sampler)
    }

    /// Build `k` hash functions drawing from an existing sampler.
    pub fn build_with(&self, k: usize, sampler: &mut RandomSampler) -> Vec<HashFunction> {
        (0..k)
            .map(|_| HashFunction::random(self.dimensionality, self.bucket_width, sampler))
            .collect()
    }
}

/// Estimate a bucket width from the data.
///
/// Samples up to `sample_size` records, finds each one's exact nearest
/// neighbor among the other records and returns
/// [`BUCKET_WIDTH_MULTIPLIER`] times the mean distance. Falls back to 1.0 for
/// collections with fewer than two records or all-identical samples.
pub fn estimate_bucket_width(collection: &RecordCollection, sample_size: usize, seed: u64) -> f32 {
    let n = collection.len();
    if n < 2 || sample_size == 0 {
        return 1.0;
    }

    let sample = RandomSampler::with_seed(seed).sample_indices(n, sample_size);
    let records = collection.records();

    let nn_distances: Vec<f32> = maybe_parallel_map_threshold(&sample, 16, |&i| {
        let query = records[i].coordinates();
        records
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, r)| squared_l2(query, r.coordinates()))
            .fold(f32::INFINITY, f32::min)
            .sqrt()
    });

    let mean = nn_distances.iter().map(|&d| d as f64).sum::<f64>() / nn_distances.len() as f64;
    let width = BUCKET_WIDTH_MULTIPLIER * mean as f32;
    if width.is_finite() && width > 0.0 {
        width
    } else {
        1.0
    }
}
