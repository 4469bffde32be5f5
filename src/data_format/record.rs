//! Vector record representation.

use crate::types::RecordId;

/// An immutable fixed-dimension vector with a stable identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    id: RecordId,
    coordinates: Vec<f32>,
}

impl VectorRecord {
    /// Create a new record.
    pub fn new(id: RecordId, coordinates: Vec<f32>) -> Self {
        Self { id, coordinates }
    }

    /// Get the identifier.
    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Get the coordinates.
    #[inline]
    pub fn coordinates(&self) -> &[f32] {
        &self.coordinates
    }

    /// Get the dimensionality.
    #[inline]
    pub fn dimensionality(&self) -> usize {
        self.coordinates.len()
    }
}

/// Sequential identifier source used by loaders.
///
/// Independent collections that must share identifiers (original and reduced
/// space of the same records) are loaded after calling [`reset`](Self::reset).
#[derive(Debug, Clone, Default)]
pub struct RecordIdCounter {
    next: RecordId,
}

impl RecordIdCounter {
    /// Create a counter starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a counter starting at `first`.
    pub fn starting_at(first: RecordId) -> Self {
        Self { next: first }
    }

    /// Hand out the next identifier.
    pub fn next_id(&mut self) -> RecordId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Identifier the next call to [`next_id`](Self::next_id) returns.
    pub fn peek(&self) -> RecordId {
        self.next
    }

    /// Start a new load batch.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
