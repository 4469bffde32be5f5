//! Hash-based approximate nearest neighbor indices.
//!
//! This module implements the random projection hash family and the two
//! index structures built from it: the amplified-hash (LSH) table family and
//! the hypercube projection index.

mod amplified;
mod hash_function;
mod hypercube;
mod lsh;

pub use amplified::{AmplifiedHash, ModularPowers, DEFAULT_BASE, DEFAULT_MODULUS};
pub use hash_function::{
    estimate_bucket_width, HashFunction, HashFunctionFamily, BUCKET_WIDTH_MULTIPLIER,
    BUCKET_WIDTH_SAMPLE_SIZE,
};
pub use hypercube::{HypercubeIndex, VertexCode};
pub use lsh::AmplifiedHashIndex;
