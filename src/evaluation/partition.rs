//! Externally supplied partitions.

use crate::clustering::ClusteringResult;
use crate::data_format::RecordCollection;
use crate::error::{HashClustError, Result};
use crate::types::RecordId;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

/// A grouping of record identifiers into clusters that did not come from
/// the clustering engine, e.g. the ground-truth classes of a data set.
///
/// No identifier appears in two clusters. The partition need not cover every
/// record of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    clusters: Vec<BTreeSet<RecordId>>,
}

impl Partition {
    /// Create a partition from per-cluster member lists.
    ///
    /// Empty clusters are dropped. An identifier listed twice fails with
    /// `DuplicateAssignment`.
    pub fn new(clusters: Vec<Vec<RecordId>>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(clusters.len());
        for (i, members) in clusters.into_iter().enumerate() {
            if members.is_empty() {
                warn!(cluster = i, "dropping empty cluster from partition");
                continue;
            }
            let mut set = BTreeSet::new();
            for id in members {
                if !seen.insert(id) {
                    return Err(HashClustError::duplicate_assignment(id));
                }
                set.insert(id);
            }
            out.push(set);
        }
        Ok(Self { clusters: out })
    }

    /// Create a partition from `(record id, cluster label)` pairs.
    ///
    /// Clusters are ordered by label.
    pub fn from_labels(labels: impl IntoIterator<Item = (RecordId, usize)>) -> Result<Self> {
        let mut clusters: Vec<Vec<RecordId>> = Vec::new();
        for (id, label) in labels {
            if label >= clusters.len() {
                clusters.resize_with(label + 1, Vec::new);
            }
            clusters[label].push(id);
        }
        Self::new(clusters)
    }

    /// Fail with `UnknownIdentifier` if a member is not in `collection`.
    pub fn validate_against(&self, collection: &RecordCollection) -> Result<()> {
        match self.clusters.iter().flatten().find(|&&id| !collection.contains(id)) {
            Some(&id) => Err(HashClustError::unknown_identifier(id)),
            None => Ok(()),
        }
    }

    /// Number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Number of assigned records.
    pub fn num_records(&self) -> usize {
        self.clusters.iter().map(BTreeSet::len).sum()
    }

    /// Member sets in cluster order.
    pub fn clusters(&self) -> &[BTreeSet<RecordId>] {
        &self.clusters
    }

    /// Cluster index holding `id`.
    pub fn cluster_of(&self, id: RecordId) -> Option<usize> {
        self.clusters.iter().position(|c| c.contains(&id))
    }
}

impl From<&ClusteringResult> for Partition {
    fn from(result: &ClusteringResult) -> Self {
        Self {
            clusters: result
                .clusters
                .iter()
                .filter(|c| !c.is_empty())
                .map(|c| c.members.clone())
                .collect(),
        }
    }
}
