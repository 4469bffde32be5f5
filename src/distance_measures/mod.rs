//! Distance measures for hashclust.
//!
//! Indices and clustering compare records by Euclidean distance. The
//! squared form is used wherever only an ordering or a sum of squares is
//! needed. Manhattan distance and the earth mover's distance over image
//! windows back the metric comparison search.

mod emd;
mod one_to_many;

pub use emd::{EarthMoverDistance, WindowGrid};
pub use one_to_many::{nearest_of, one_to_many_l2};

use crate::error::{HashClustError, Result};

/// Squared Euclidean distance between two equal-length vectors.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut sum = 0.0f32;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let d = x - y;
        sum += d * d;
    }
    sum
}

/// Euclidean distance between two equal-length vectors.
#[inline]
pub fn l2(a: &[f32], b: &[f32]) -> f32 {
    squared_l2(a, b).sqrt()
}

/// Manhattan (L1) distance between two equal-length vectors.
#[inline]
pub fn l1(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
}

/// Dot product of two equal-length vectors.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// Euclidean distance, failing if the dimensions differ.
pub fn checked_l2(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(HashClustError::dimension_mismatch(a.len(), b.len()));
    }
    Ok(l2(a, b))
}

/// Componentwise mean of a non-empty set of vectors of dimension `dim`.
///
/// Accumulates in f64. Returns `None` when `vectors` yields nothing.
pub fn componentwise_mean<'a, I>(vectors: I, dim: usize) -> Option<Vec<f32>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut sums = vec![0.0f64; dim];
    let mut count = 0usize;
    for v in vectors {
        debug_assert_eq!(v.len(), dim);
        for (s, &x) in sums.iter_mut().zip(v.iter()) {
            *s += x as f64;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sums.into_iter().map(|s| (s / count as f64) as f32).collect())
}
