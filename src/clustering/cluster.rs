//! Cluster and clustering result types.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One cluster: a centroid and the identifiers of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster index, `0..K`.
    pub id: usize,

    /// Centroid coordinates.
    pub centroid: Vec<f32>,

    /// Member identifiers, resolved against the clustered collection.
    pub members: BTreeSet<RecordId>,
}

impl Cluster {
    /// Create a new cluster.
    pub fn new(id: usize, centroid: Vec<f32>, members: BTreeSet<RecordId>) -> Self {
        Self { id, centroid, members }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check membership of a record.
    pub fn contains(&self, id: RecordId) -> bool {
        self.members.contains(&id)
    }
}

/// Output of a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// The K clusters, indexed by cluster id.
    pub clusters: Vec<Cluster>,

    /// Number of assignment passes performed.
    pub iterations: usize,

    /// Whether a convergence criterion was met before the iteration cap.
    pub converged: bool,

    /// Objective value after every update phase.
    pub objective_history: Vec<f64>,

    /// Number of empty clusters that were reseeded.
    pub reseeds: usize,
}

impl ClusteringResult {
    /// Number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Total number of assigned records.
    pub fn num_records(&self) -> usize {
        self.clusters.iter().map(Cluster::len).sum()
    }

    /// Cluster index holding `id`.
    pub fn cluster_of(&self, id: RecordId) -> Option<usize> {
        self.clusters.iter().position(|c| c.contains(id))
    }

    /// Centroids in cluster order.
    pub fn centroids(&self) -> Vec<&[f32]> {
        self.clusters.iter().map(|c| c.centroid.as_slice()).collect()
    }

    /// Member sets in cluster order.
    pub fn memberships(&self) -> Vec<BTreeSet<RecordId>> {
        self.clusters.iter().map(|c| c.members.clone()).collect()
    }

    /// Objective value after the last update phase.
    pub fn final_objective(&self) -> Option<f64> {
        self.objective_history.last().copied()
    }
}
