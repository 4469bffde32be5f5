//! Empty cluster reseeding.

use crate::config::ReseedPolicy;
use crate::data_format::RecordCollection;
use crate::distance_measures::squared_l2;
use crate::utils::random::RandomSampler;
use tracing::warn;

/// Move one record into every empty cluster and make it that cluster's
/// centroid.
///
/// `labels` holds the cluster index of every record by collection position.
/// Donor records are only taken from clusters with more than one member, so
/// no reseed can empty another cluster. Returns the number of reseeded
/// clusters.
pub(crate) fn reseed_empty_clusters(
    collection: &RecordCollection,
    labels: &mut [usize],
    centroids: &mut [Vec<f32>],
    policy: ReseedPolicy,
    sampler: &mut RandomSampler,
) -> usize {
    let mut counts = vec![0usize; centroids.len()];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    let mut reseeded = 0;
    while let Some(empty) = counts.iter().position(|&c| c == 0) {
        let eligible: Vec<usize> = (0..labels.len()).filter(|&p| counts[labels[p]] > 1).collect();
        let donor = match policy {
            ReseedPolicy::FarthestRecord => farthest(collection, labels, centroids, &eligible),
            ReseedPolicy::RandomRecord if !eligible.is_empty() => {
                Some(eligible[sampler.random_index(eligible.len())])
            }
            ReseedPolicy::RandomRecord => None,
        };
        let Some(donor) = donor else {
            warn!(cluster = empty, "no record available to reseed empty cluster");
            break;
        };

        let record = collection.at(donor);
        counts[labels[donor]] -= 1;
        counts[empty] += 1;
        labels[donor] = empty;
        centroids[empty] = record.coordinates().to_vec();
        reseeded += 1;
        warn!(cluster = empty, record = record.id(), ?policy, "reseeded empty cluster");
    }
    reseeded
}

/// Eligible position farthest from its own centroid; ties go to the smaller position.
fn farthest(
    collection: &RecordCollection,
    labels: &[usize],
    centroids: &[Vec<f32>],
    eligible: &[usize],
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for &p in eligible {
        let d = squared_l2(collection.at(p).coordinates(), &centroids[labels[p]]);
        match best {
            Some((_, best_d)) if d <= best_d => {}
            _ => best = Some((p, d)),
        }
    }
    best.map(|(p, _)| p)
}
