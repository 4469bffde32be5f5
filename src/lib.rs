//! # hashclust
//!
//! Approximate nearest neighbor indices and k-means clustering built on them.
//!
//! ## Overview
//!
//! - **Amplified-hash (LSH) index**: L tables of k random-projection hash
//!   functions combined into one bucket key per table
//! - **Hypercube index**: k binary hash functions mapping records to
//!   hypercube vertices, probed in increasing Hamming distance
//! - **Clustering**: a k-means state machine whose assignment step is exact
//!   or a reverse range-query pass over either index
//! - **Evaluation**: silhouette and objective scores, also across two
//!   coordinate spaces sharing record identifiers
//! - **Metric comparison**: earth mover's distance over window signatures
//!   against Manhattan distance, scored by neighbor label agreement
//!
//! ## Quick Start
//!
//! ```rust
//! use hashclust::prelude::*;
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 10.0],
//!     vec![10.0, 11.0],
//! ];
//! let collection = RecordCollection::from_vecs(data).unwrap();
//!
//! let config = ClusteringConfig::new(2).with_seed(7);
//! let result = ClusteringEngine::new(&collection, config).unwrap().run().unwrap();
//!
//! let evaluation = Evaluator::new(&collection).evaluate(&result).unwrap();
//! println!("silhouette: {:?}", evaluation.silhouette.as_sequence());
//! println!("objective: {}", evaluation.objective);
//! ```
//!
//! ## Approximate Search
//!
//! ```rust
//! use hashclust::prelude::*;
//!
//! let data: Vec<Vec<f32>> = (0..100).map(|i| vec![i as f32, (i % 10) as f32]).collect();
//! let collection = RecordCollection::from_vecs(data).unwrap();
//!
//! let index = AmplifiedHashIndex::build(&collection, LshConfig::new(4, 5)).unwrap();
//! let approx = index.nearest_neighbor(&[42.3, 2.0], 50).unwrap();
//! let exact = BruteForceSearcher::new(&collection).nearest(&[42.3, 2.0]).unwrap();
//!
//! if let (Some(a), Some(e)) = (approx, exact) {
//!     assert!(a.distance >= e.distance);
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`data_format`]: Records and record collections
//! - [`distance_measures`]: Euclidean, Manhattan and earth mover's distances
//! - [`hashes`]: Hash functions, amplified-hash and hypercube indices
//! - [`brute_force`]: Exact nearest neighbor search
//! - [`clustering`]: k-means engine and assignment strategies
//! - [`evaluation`]: Silhouette, objective function, partitions
//! - [`search`]: Cross-space and cross-metric nearest neighbor comparison
//! - [`io`]: IDX images and labels, partition and report files

pub mod brute_force;
pub mod clustering;
pub mod config;
pub mod data_format;
pub mod distance_measures;
pub mod evaluation;
pub mod hashes;
pub mod io;
pub mod logging;
pub mod search;
pub mod utils;

mod error;
mod types;

pub use clustering::{ClusteringEngine, ClusteringResult};
pub use error::{ErrorCode, HashClustError, Result};
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::brute_force::{nearest_centroid, BruteForceSearcher};
    pub use crate::clustering::{
        Assigner, BruteForceAssigner, Cluster, ClusteringEngine, ClusteringResult,
        HypercubeAssigner, LshAssigner, Phase,
    };
    pub use crate::config::{
        AssignmentMethod, ClusteringConfig, EmdSearchConfig, HypercubeConfig, InitPolicy,
        LshConfig, RangeSearchConfig, ReseedPolicy, SearchConfig,
    };
    pub use crate::data_format::{RecordCollection, RecordIdCounter, VectorRecord};
    pub use crate::distance_measures::{l1, l2, squared_l2, EarthMoverDistance, WindowGrid};
    pub use crate::error::{ErrorCode, HashClustError, Result};
    pub use crate::evaluation::{
        centroidize, objective_function, silhouette, Evaluation, Evaluator, Partition,
        SilhouetteReport,
    };
    pub use crate::hashes::{AmplifiedHashIndex, HashFunctionFamily, HypercubeIndex, ModularPowers};
    pub use crate::search::{
        ComparisonReport, CrossSpaceSearcher, MetricComparison, QueryComparison, QueryReport,
        SearchReport,
    };
    pub use crate::types::*;
}
