//! Brute-force (exact) nearest neighbor search.

mod searcher;
mod top_k;

pub use searcher::{nearest_centroid, BruteForceSearcher};
pub use top_k::TopK;
