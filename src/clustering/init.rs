//! Initial centroid selection.
//!
//! Both policies pick K records of the collection whose coordinates are
//! pairwise distinct. They only look at the records, never at any cluster
//! structure.

use crate::config::InitPolicy;
use crate::data_format::RecordCollection;
use crate::distance_measures::squared_l2;
use crate::error::{HashClustError, Result};
use crate::utils::random::RandomSampler;
use tracing::debug;

/// Choose `k` distinct initial centroids.
pub fn initial_centroids(
    collection: &RecordCollection,
    k: usize,
    policy: InitPolicy,
    sampler: &mut RandomSampler,
) -> Result<Vec<Vec<f32>>> {
    if k == 0 || k > collection.len() {
        return Err(HashClustError::configuration(format!(
            "cannot choose {k} centroids from {} records",
            collection.len()
        )));
    }
    let centroids = match policy {
        InitPolicy::Random => random_init(collection, k, sampler)?,
        InitPolicy::KMeansPlusPlus => kmeans_plusplus_init(collection, k, sampler)?,
    };
    debug!(k, ?policy, "chose initial centroids");
    Ok(centroids)
}

fn not_enough_distinct(k: usize, found: usize) -> HashClustError {
    HashClustError::configuration(format!(
        "need {k} distinct points for initial centroids, found only {found}"
    ))
}

/// Uniformly random records, skipping coordinates already chosen.
fn random_init(
    collection: &RecordCollection,
    k: usize,
    sampler: &mut RandomSampler,
) -> Result<Vec<Vec<f32>>> {
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    for pos in sampler.permutation(collection.len()) {
        let coords = collection.at(pos).coordinates();
        if centroids.iter().any(|c| c.as_slice() == coords) {
            continue;
        }
        centroids.push(coords.to_vec());
        if centroids.len() == k {
            return Ok(centroids);
        }
    }
    Err(not_enough_distinct(k, centroids.len()))
}

/// k-means++: each further centroid is drawn with probability proportional
/// to the squared distance to the nearest centroid chosen so far.
fn kmeans_plusplus_init(
    collection: &RecordCollection,
    k: usize,
    sampler: &mut RandomSampler,
) -> Result<Vec<Vec<f32>>> {
    let mut centroids = Vec::with_capacity(k);

    let first = collection.at(sampler.random_index(collection.len())).coordinates();
    centroids.push(first.to_vec());

    // Records identical to a chosen centroid have weight zero and are never drawn.
    let mut min_distances: Vec<f64> = collection
        .iter()
        .map(|r| squared_l2(r.coordinates(), first) as f64)
        .collect();

    while centroids.len() < k {
        let selected = sampler
            .weighted_index(&min_distances)
            .ok_or_else(|| not_enough_distinct(k, centroids.len()))?;
        let new_center = collection.at(selected).coordinates();
        centroids.push(new_center.to_vec());

        for (d, record) in min_distances.iter_mut().zip(collection.iter()) {
            let new_dist = squared_l2(record.coordinates(), new_center) as f64;
            if new_dist < *d {
                *d = new_dist;
            }
        }
    }

    Ok(centroids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn collection() -> RecordCollection {
        RecordCollection::from_vecs((0..20).map(|i| vec![i as f32, (i * i % 11) as f32]).collect())
            .unwrap()
    }

    fn assert_distinct(centroids: &[Vec<f32>]) {
        for i in 0..centroids.len() {
            for j in (i + 1)..centroids.len() {
                assert_ne!(centroids[i], centroids[j]);
            }
        }
    }

    #[test]
    fn test_policies_give_k_distinct_centroids() {
        let collection = collection();
        for policy in [InitPolicy::Random, InitPolicy::KMeansPlusPlus] {
            let mut sampler = RandomSampler::with_seed(7);
            let centroids = initial_centroids(&collection, 6, policy, &mut sampler).unwrap();
            assert_eq!(centroids.len(), 6);
            assert!(centroids.iter().all(|c| c.len() == 2));
            assert_distinct(&centroids);
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let collection = collection();
        let a = initial_centroids(&collection, 4, InitPolicy::KMeansPlusPlus, &mut RandomSampler::with_seed(3)).unwrap();
        let b = initial_centroids(&collection, 4, InitPolicy::KMeansPlusPlus, &mut RandomSampler::with_seed(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let collection = RecordCollection::from_vecs(vec![
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
            vec![2.0, 2.0],
        ])
        .unwrap();
        for policy in [InitPolicy::Random, InitPolicy::KMeansPlusPlus] {
            let centroids = initial_centroids(&collection, 2, policy, &mut RandomSampler::with_seed(1)).unwrap();
            assert_distinct(&centroids);

            let err = initial_centroids(&collection, 3, policy, &mut RandomSampler::with_seed(1)).unwrap_err();
            assert_eq!(err.code(), ErrorCode::Configuration);
        }
    }

    #[test]
    fn test_k_out_of_range() {
        let collection = collection();
        let mut sampler = RandomSampler::with_seed(1);
        assert!(initial_centroids(&collection, 0, InitPolicy::Random, &mut sampler).is_err());
        assert!(initial_centroids(&collection, 21, InitPolicy::Random, &mut sampler).is_err());
    }
}
