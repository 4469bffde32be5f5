//! Top-K selection utilities.
//!
//! This module provides the data structure for tracking the k nearest
//! neighbors during exact search.

use crate::types::{NNResultPair, RecordId};
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

/// A max-heap based top-k tracker.
///
/// Maintains the k smallest `(distance, id)` pairs seen so far. Pairs compare
/// by distance first and id second, so equal distances keep the smaller ids.
#[derive(Debug)]
pub struct TopK {
    /// Max-heap of (distance, id) pairs; the root is the current worst.
    heap: BinaryHeap<(OrderedFloat<f32>, RecordId)>,

    /// Maximum capacity.
    k: usize,
}

impl TopK {
    /// Create a new top-k tracker.
    pub fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
        }
    }

    /// Get the current size.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Get the capacity (k).
    pub fn capacity(&self) -> usize {
        self.k
    }

    /// Get the current threshold distance.
    /// If we have k elements, this is the largest distance in the heap.
    /// Otherwise, returns infinity.
    pub fn threshold(&self) -> f32 {
        if self.heap.len() >= self.k {
            self.heap.peek().map(|(d, _)| d.0).unwrap_or(f32::INFINITY)
        } else {
            f32::INFINITY
        }
    }

    /// Try to push a new element.
    /// Returns true if the element was kept.
    pub fn push(&mut self, id: RecordId, distance: f32) -> bool {
        if self.k == 0 {
            return false;
        }
        let entry = (OrderedFloat(distance), id);
        if self.heap.len() < self.k {
            self.heap.push(entry);
            true
        } else if self.heap.peek().is_some_and(|worst| entry < *worst) {
            self.heap.pop();
            self.heap.push(entry);
            true
        } else {
            false
        }
    }

    /// Drain results sorted by distance, then id (ascending).
    pub fn drain_sorted(&mut self) -> Vec<NNResultPair> {
        let mut entries: Vec<_> = self.heap.drain().collect();
        entries.sort_unstable();
        entries.into_iter().map(|(d, id)| (id, d.0)).collect()
    }
}
