//! One-to-many distance computations.
//!
//! Batch distance computations from a single query to many vectors. Each
//! target is independent, so large batches are spread over the rayon pool.

use crate::distance_measures::{l2, squared_l2};
use rayon::prelude::*;

/// Batches smaller than this are computed on the calling thread.
const ONE_TO_MANY_PARALLEL_THRESHOLD: usize = 2048;

/// Compute Euclidean distances from `query` to every vector in `database`.
pub fn one_to_many_l2<V>(query: &[f32], database: &[V], results: &mut [f32])
where
    V: AsRef<[f32]> + Sync,
{
    debug_assert_eq!(database.len(), results.len());

    if database.len() >= ONE_TO_MANY_PARALLEL_THRESHOLD {
        results
            .par_iter_mut()
            .zip(database.par_iter())
            .for_each(|(r, v)| *r = l2(query, v.as_ref()));
    } else {
        for (r, v) in results.iter_mut().zip(database.iter()) {
            *r = l2(query, v.as_ref());
        }
    }
}

/// Index and squared distance of the vector in `candidates` nearest to `query`.
///
/// Ties go to the smaller index. Returns `None` for an empty slice.
#[inline]
pub fn nearest_of<V: AsRef<[f32]>>(query: &[f32], candidates: &[V]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in candidates.iter().enumerate() {
        let d = squared_l2(query, c.as_ref());
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}
