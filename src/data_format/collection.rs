//! Record collections.
//!
//! A collection owns its records. Indices and clusters only keep record
//! identifiers, which are resolved back against the owning collection.

use crate::data_format::record::{RecordIdCounter, VectorRecord};
use crate::error::{HashClustError, Result};
use crate::types::RecordId;
use std::collections::HashMap;

/// An owned set of records sharing one dimensionality.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    /// Records in insertion order.
    records: Vec<VectorRecord>,

    /// Dimensionality shared by every record.
    dimensionality: usize,

    /// Record id -> position in `records`.
    positions: HashMap<RecordId, usize>,
}

impl RecordCollection {
    /// Create an empty collection of the given dimensionality.
    pub fn new(dimensionality: usize) -> Self {
        Self {
            records: Vec::new(),
            dimensionality,
            positions: HashMap::new(),
        }
    }

    /// Create a collection from raw vectors with identifiers 0, 1, 2, ...
    pub fn from_vecs(vecs: Vec<Vec<f32>>) -> Result<Self> {
        let mut counter = RecordIdCounter::new();
        Self::from_vecs_with_counter(vecs, &mut counter)
    }

    /// Create a collection from raw vectors, drawing identifiers from `counter`.
    pub fn from_vecs_with_counter(
        vecs: Vec<Vec<f32>>,
        counter: &mut RecordIdCounter,
    ) -> Result<Self> {
        let dimensionality = vecs.first().map(Vec::len).unwrap_or(0);
        let mut collection = Self::new(dimensionality);
        collection.records.reserve(vecs.len());
        for coordinates in vecs {
            collection.push(coordinates, counter)?;
        }
        Ok(collection)
    }

    /// Create a collection from pre-built records.
    pub fn from_records(records: Vec<VectorRecord>) -> Result<Self> {
        let dimensionality = records.first().map(VectorRecord::dimensionality).unwrap_or(0);
        let mut collection = Self::new(dimensionality);
        for record in records {
            collection.insert(record)?;
        }
        Ok(collection)
    }

    /// Append a vector, assigning it the next identifier of `counter`.
    pub fn push(&mut self, coordinates: Vec<f32>, counter: &mut RecordIdCounter) -> Result<RecordId> {
        let id = counter.next_id();
        self.insert(VectorRecord::new(id, coordinates))?;
        Ok(id)
    }

    /// Append a record.
    pub fn insert(&mut self, record: VectorRecord) -> Result<()> {
        if self.records.is_empty() && self.dimensionality == 0 {
            self.dimensionality = record.dimensionality();
        }
        if record.dimensionality() != self.dimensionality {
            return Err(HashClustError::dimension_mismatch(
                self.dimensionality,
                record.dimensionality(),
            ));
        }
        if self.positions.contains_key(&record.id()) {
            return Err(HashClustError::configuration(format!(
                "record id {} appears twice in one collection",
                record.id()
            )));
        }
        self.positions.insert(record.id(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality shared by every record.
    #[inline]
    pub fn dimensionality(&self) -> usize {
        self.dimensionality
    }

    /// Look up a record by identifier.
    pub fn get(&self, id: RecordId) -> Option<&VectorRecord> {
        self.positions.get(&id).map(|&pos| &self.records[pos])
    }

    /// Look up a record by identifier, failing on unknown ids.
    pub fn record(&self, id: RecordId) -> Result<&VectorRecord> {
        self.get(id).ok_or_else(|| HashClustError::unknown_identifier(id))
    }

    /// Position of a record in insertion order.
    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Check whether an identifier is present.
    pub fn contains(&self, id: RecordId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Record at a given position.
    #[inline]
    pub fn at(&self, position: usize) -> &VectorRecord {
        &self.records[position]
    }

    /// All records in insertion order.
    #[inline]
    pub fn records(&self) -> &[VectorRecord] {
        &self.records
    }

    /// Iterate over the records.
    pub fn iter(&self) -> impl Iterator<Item = &VectorRecord> {
        self.records.iter()
    }

    /// Iterate over the identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.records.iter().map(VectorRecord::id)
    }

    /// Fail unless `query` has the collection's dimensionality.
    pub fn check_dimensionality(&self, query: &[f32]) -> Result<()> {
        if query.len() != self.dimensionality {
            return Err(HashClustError::dimension_mismatch(self.dimensionality, query.len()));
        }
        Ok(())
    }

    /// Fail unless both collections hold exactly the same identifiers.
    pub fn check_correspondence(&self, other: &RecordCollection) -> Result<()> {
        if self.len() != other.len() {
            return Err(HashClustError::correspondence(format!(
                "collections differ in size ({} vs {})",
                self.len(),
                other.len()
            )));
        }
        if let Some(missing) = self.ids().find(|id| !other.contains(*id)) {
            return Err(HashClustError::correspondence(format!(
                "record {missing} has no counterpart in the other collection"
            )));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a VectorRecord;
    type IntoIter = std::slice::Iter<'a, VectorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
