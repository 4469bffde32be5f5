//! Clustering quality evaluation.
//!
//! Scores are pure functions of the clusters and the scoring collection:
//! evaluating the same input twice gives identical numbers.

use crate::clustering::{Cluster, ClusteringResult};
use crate::data_format::RecordCollection;
use crate::error::Result;
use crate::evaluation::objective::{centroidize, objective_function};
use crate::evaluation::partition::Partition;
use crate::evaluation::silhouette::{silhouette, SilhouetteReport};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quality scores of one clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Silhouette coefficients.
    pub silhouette: SilhouetteReport,

    /// Sum of squared distances to the assigned centroids.
    pub objective: f64,
}

/// Scores clusterings against one collection.
pub struct Evaluator<'a> {
    scoring: &'a RecordCollection,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator that measures distances in `scoring`.
    pub fn new(scoring: &'a RecordCollection) -> Self {
        Self { scoring }
    }

    /// The collection distances are measured in.
    pub fn scoring_collection(&self) -> &'a RecordCollection {
        self.scoring
    }

    /// Score clusters whose centroids already live in the scoring space.
    pub fn evaluate_clusters(&self, clusters: &[Cluster]) -> Result<Evaluation> {
        let silhouette = silhouette(self.scoring, clusters)?;
        let objective = objective_function(self.scoring, clusters)?;
        debug!(
            clusters = clusters.len(),
            overall = silhouette.overall,
            objective,
            "evaluated clustering"
        );
        Ok(Evaluation { silhouette, objective })
    }

    /// Score a clustering computed on the scoring collection itself.
    pub fn evaluate(&self, result: &ClusteringResult) -> Result<Evaluation> {
        self.evaluate_clusters(&result.clusters)
    }

    /// Score a clustering computed on `clustered`, a different coordinate
    /// space over the same record identifiers.
    ///
    /// Memberships are kept; centroids are recomputed from the scoring
    /// collection, and every distance is measured there.
    pub fn evaluate_cross_space(
        &self,
        result: &ClusteringResult,
        clustered: &RecordCollection,
    ) -> Result<Evaluation> {
        self.scoring.check_correspondence(clustered)?;
        let clusters = centroidize(self.scoring, &result.memberships())?;
        self.evaluate_clusters(&clusters)
    }

    /// Score an external partition, centroidized in the scoring space.
    pub fn evaluate_partition(&self, partition: &Partition) -> Result<Evaluation> {
        partition.validate_against(self.scoring)?;
        let clusters = centroidize(self.scoring, partition.clusters())?;
        self.evaluate_clusters(&clusters)
    }
}
