//! Core type definitions for hashclust.
//!
//! This module contains the fundamental type aliases shared by the indices,
//! the clustering engine and the evaluator.

use serde::{Deserialize, Serialize};

/// Stable identifier of a record inside one collection.
/// Assigned sequentially by the loader; can represent up to 4 billion records.
pub type RecordId = u32;

/// A nearest neighbor result: (record id, Euclidean distance).
pub type NNResultPair = (RecordId, f32);

/// Vector of nearest neighbor results.
pub type NNResultsVector = Vec<NNResultPair>;

/// A single retrieved neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Identifier of the neighbor in the searched collection.
    pub id: RecordId,

    /// Euclidean distance to the query.
    pub distance: f32,
}

impl Neighbor {
    /// Create a new neighbor.
    pub fn new(id: RecordId, distance: f32) -> Self {
        Self { id, distance }
    }

    /// Returns true if `self` is strictly better than `other`:
    /// smaller distance, or equal distance and smaller id.
    #[inline]
    pub fn is_better_than(&self, other: &Neighbor) -> bool {
        self.distance < other.distance || (self.distance == other.distance && self.id < other.id)
    }
}

impl From<NNResultPair> for Neighbor {
    fn from((id, distance): NNResultPair) -> Self {
        Self { id, distance }
    }
}
