//! Brute-force searcher implementation.
//!
//! Exact nearest neighbor search over a record collection. It is the
//! baseline the approximate indices are compared against and the fallback
//! that guarantees every record gets a cluster.

use crate::brute_force::top_k::TopK;
use crate::data_format::RecordCollection;
use crate::distance_measures::{l2, nearest_of, one_to_many_l2};
use crate::error::Result;
use crate::types::{Neighbor, NNResultsVector};
use rayon::prelude::*;

/// Exact nearest centroid of `point`: (cluster index, Euclidean distance).
///
/// Ties go to the smaller cluster index. `None` when `centroids` is empty.
#[inline]
pub fn nearest_centroid<V: AsRef<[f32]>>(point: &[f32], centroids: &[V]) -> Option<(usize, f32)> {
    nearest_of(point, centroids).map(|(i, d)| (i, d.sqrt()))
}

/// Brute-force nearest neighbor searcher.
pub struct BruteForceSearcher<'a> {
    /// The collection to search.
    collection: &'a RecordCollection,

    /// Minimum batch size for parallel search.
    parallel_batch_threshold: usize,
}

impl<'a> BruteForceSearcher<'a> {
    /// Create a new brute-force searcher.
    pub fn new(collection: &'a RecordCollection) -> Self {
        Self {
            collection,
            parallel_batch_threshold: 100,
        }
    }

    /// Set the minimum batch size for parallel search.
    pub fn set_parallel_batch_threshold(&mut self, threshold: usize) {
        self.parallel_batch_threshold = threshold;
    }

    /// Get the collection.
    pub fn collection(&self) -> &'a RecordCollection {
        self.collection
    }

    /// Search for the k nearest neighbors, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<NNResultsVector> {
        self.collection.check_dimensionality(query)?;

        let records = self.collection.records();
        let coords: Vec<&[f32]> = records.iter().map(|r| r.coordinates()).collect();
        let mut distances = vec![0.0f32; records.len()];
        one_to_many_l2(query, &coords, &mut distances);

        let mut top_k = TopK::new(k.min(records.len()));
        for (record, &dist) in records.iter().zip(distances.iter()) {
            top_k.push(record.id(), dist);
        }

        Ok(top_k.drain_sorted())
    }

    /// Exact nearest neighbor; ties go to the smaller id.
    pub fn nearest(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        self.collection.check_dimensionality(query)?;
        let mut best: Option<Neighbor> = None;
        for record in self.collection {
            let candidate = Neighbor::new(record.id(), l2(query, record.coordinates()));
            if best.map_or(true, |b| candidate.is_better_than(&b)) {
                best = Some(candidate);
            }
        }
        Ok(best)
    }

    /// All records within `radius` of `query`, ordered by record id.
    pub fn search_radius(&self, query: &[f32], radius: f32) -> Result<NNResultsVector> {
        self.collection.check_dimensionality(query)?;
        Ok(self
            .collection
            .iter()
            .filter_map(|r| {
                let d = l2(query, r.coordinates());
                (d <= radius).then_some((r.id(), d))
            })
            .collect())
    }

    /// Batched search for multiple queries.
    pub fn search_batched(&self, queries: &[Vec<f32>], k: usize) -> Result<Vec<NNResultsVector>> {
        if queries.len() >= self.parallel_batch_threshold {
            queries.par_iter().map(|q| self.search(q, k)).collect()
        } else {
            queries.iter().map(|q| self.search(q, k)).collect()
        }
    }
}
