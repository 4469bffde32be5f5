//! Silhouette coefficients.

use crate::clustering::Cluster;
use crate::data_format::RecordCollection;
use crate::distance_measures::l2;
use crate::error::Result;
use crate::types::RecordId;
use crate::utils::parallel::maybe_parallel_map_threshold;
use serde::{Deserialize, Serialize};

/// Records scored per thread batch before going parallel.
const SILHOUETTE_PARALLEL_THRESHOLD: usize = 64;

/// Silhouette coefficients of one clustering.
///
/// A record alone in its cluster scores 0, and so does every record when
/// there is only one non-empty cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteReport {
    /// `(record id, s(i))` in cluster order, then id order.
    pub per_record: Vec<(RecordId, f64)>,

    /// Mean coefficient of every cluster; 0 for empty clusters.
    pub per_cluster: Vec<f64>,

    /// Mean coefficient over all records.
    pub overall: f64,
}

impl SilhouetteReport {
    /// Per-cluster means followed by the overall mean.
    pub fn as_sequence(&self) -> Vec<f64> {
        let mut seq = self.per_cluster.clone();
        seq.push(self.overall);
        seq
    }
}

/// Silhouette of `clusters`, with member coordinates taken from `collection`.
///
/// Cluster centroids are not used. Fails with `UnknownIdentifier` if a
/// member is not in `collection`.
pub fn silhouette(collection: &RecordCollection, clusters: &[Cluster]) -> Result<SilhouetteReport> {
    let mut members: Vec<Vec<&[f32]>> = Vec::with_capacity(clusters.len());
    let mut points: Vec<(usize, RecordId, &[f32])> = Vec::new();
    for (c, cluster) in clusters.iter().enumerate() {
        let mut coords = Vec::with_capacity(cluster.len());
        for &id in &cluster.members {
            let x = collection.record(id)?.coordinates();
            coords.push(x);
            points.push((c, id, x));
        }
        members.push(coords);
    }

    let scores = maybe_parallel_map_threshold(&points, SILHOUETTE_PARALLEL_THRESHOLD, |&(c, _, x)| {
        coefficient(x, c, &members)
    });

    let mut per_cluster = vec![0.0f64; clusters.len()];
    for (&(c, _, _), &s) in points.iter().zip(&scores) {
        per_cluster[c] += s;
    }
    for (sum, cluster) in per_cluster.iter_mut().zip(clusters) {
        if !cluster.is_empty() {
            *sum /= cluster.len() as f64;
        }
    }

    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };

    Ok(SilhouetteReport {
        per_record: points.iter().zip(scores).map(|(&(_, id, _), s)| (id, s)).collect(),
        per_cluster,
        overall,
    })
}

/// `s(i)` for a point `x` of cluster `own`.
fn coefficient(x: &[f32], own: usize, members: &[Vec<&[f32]>]) -> f64 {
    let own_size = members[own].len();
    if own_size <= 1 {
        return 0.0;
    }
    // x itself contributes a zero distance to its own sum.
    let a = distance_sum(x, &members[own]) / (own_size - 1) as f64;

    let b = members
        .iter()
        .enumerate()
        .filter(|(d, m)| *d != own && !m.is_empty())
        .map(|(_, m)| distance_sum(x, m) / m.len() as f64)
        .fold(f64::INFINITY, f64::min);
    if !b.is_finite() {
        return 0.0;
    }

    let denom = a.max(b);
    if denom > 0.0 {
        (b - a) / denom
    } else {
        0.0
    }
}

fn distance_sum(x: &[f32], others: &[&[f32]]) -> f64 {
    others.iter().map(|y| l2(x, y) as f64).sum()
}
