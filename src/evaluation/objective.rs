//! Objective function and centroid recomputation.

use crate::clustering::Cluster;
use crate::data_format::RecordCollection;
use crate::distance_measures::{componentwise_mean, squared_l2};
use crate::error::{HashClustError, Result};
use crate::types::RecordId;
use std::collections::BTreeSet;

/// Sum over all members of the squared Euclidean distance to their
/// cluster's centroid, with coordinates taken from `collection`.
pub fn objective_function(collection: &RecordCollection, clusters: &[Cluster]) -> Result<f64> {
    let mut total = 0.0f64;
    for cluster in clusters {
        collection.check_dimensionality(&cluster.centroid)?;
        for &id in &cluster.members {
            let x = collection.record(id)?.coordinates();
            total += squared_l2(x, &cluster.centroid) as f64;
        }
    }
    Ok(total)
}

/// Rebuild clusters over `collection`: same members, each centroid the
/// componentwise mean of the members' coordinates in `collection`.
pub fn centroidize(collection: &RecordCollection, memberships: &[BTreeSet<RecordId>]) -> Result<Vec<Cluster>> {
    memberships
        .iter()
        .enumerate()
        .map(|(i, members)| {
            let coords = members
                .iter()
                .map(|&id| collection.record(id).map(|r| r.coordinates()))
                .collect::<Result<Vec<_>>>()?;
            let centroid = componentwise_mean(coords, collection.dimensionality())
                .ok_or_else(|| HashClustError::configuration(format!("cluster {i} has no members")))?;
            Ok(Cluster::new(i, centroid, members.clone()))
        })
        .collect()
}
