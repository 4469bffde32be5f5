//! Utility functions and types for hashclust.

pub mod bits;
pub(crate) mod parallel;
pub(crate) mod random;

pub use bits::{hamming_distance_u32, HammingMasks};
pub use parallel::MIN_PARALLEL_SIZE;
pub use random::RandomSampler;
