//! k-means clustering with exact or index-backed assignment.
//!
//! [`ClusteringEngine`] drives the Init, Assign and Update phases. The
//! assignment strategy is an [`Assigner`]: exact ([`BruteForceAssigner`]) or
//! reverse assignment through an amplified-hash or hypercube index
//! ([`LshAssigner`], [`HypercubeAssigner`]).

mod assign;
mod cluster;
mod engine;
mod init;
mod reseed;

pub use assign::{
    Assigner, AssignmentPass, BruteForceAssigner, HypercubeAssigner, LshAssigner, RangeIndex,
    ReverseAssigner,
};
pub use cluster::{Cluster, ClusteringResult};
pub use engine::{ClusteringEngine, Phase};
pub use init::initial_centroids;
