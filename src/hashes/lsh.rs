//! Amplified-hash (LSH) index.
//!
//! `L` independent tables, each bucketing record identifiers by the key of
//! its own [`AmplifiedHash`]. The index borrows the collection it was built
//! over; buckets only hold identifiers, which are resolved against that
//! collection whenever a true distance is needed.

use crate::config::LshConfig;
use crate::data_format::{RecordCollection, VectorRecord};
use crate::distance_measures::l2;
use crate::error::{HashClustError, Result};
use crate::hashes::amplified::{AmplifiedHash, ModularPowers};
use crate::hashes::hash_function::{estimate_bucket_width, HashFunctionFamily, BUCKET_WIDTH_SAMPLE_SIZE};
use crate::types::{Neighbor, NNResultsVector, RecordId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// One table of the index.
#[derive(Debug, Clone)]
struct HashTable {
    hash: AmplifiedHash,
    buckets: HashMap<u64, Vec<RecordId>>,
}

impl HashTable {
    fn insert(&mut self, record: &VectorRecord) {
        let key = self.hash.key(record.coordinates());
        self.buckets.entry(key).or_default().push(record.id());
    }

    fn bucket(&self, query: &[f32]) -> &[RecordId] {
        self.buckets
            .get(&self.hash.key(query))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Amplified-hash index over (a subset of) one record collection.
#[derive(Debug, Clone)]
pub struct AmplifiedHashIndex<'a> {
    collection: &'a RecordCollection,
    config: LshConfig,
    bucket_width: f32,
    powers: Arc<ModularPowers>,
    tables: Vec<HashTable>,
    indexed: HashSet<RecordId>,
}

impl<'a> AmplifiedHashIndex<'a> {
    /// Build an index over every record of `collection`.
    pub fn build(collection: &'a RecordCollection, config: LshConfig) -> Result<Self> {
        let records: Vec<&VectorRecord> = collection.iter().collect();
        let mut index = Self::empty(collection, config)?;
        index.insert_all(&records);
        Ok(index)
    }

    /// Build an index over the records of `collection` named by `ids`.
    pub fn build_subset(
        collection: &'a RecordCollection,
        ids: &[RecordId],
        config: LshConfig,
    ) -> Result<Self> {
        let records = ids
            .iter()
            .map(|&id| collection.record(id))
            .collect::<Result<Vec<_>>>()?;
        let mut index = Self::empty(collection, config)?;
        index.insert_all(&records);
        Ok(index)
    }

    /// Create an index with `L` empty tables.
    pub fn empty(collection: &'a RecordCollection, config: LshConfig) -> Result<Self> {
        config.validate()?;

        let bucket_width = config
            .bucket_width
            .unwrap_or_else(|| estimate_bucket_width(collection, BUCKET_WIDTH_SAMPLE_SIZE, config.seed));
        let family = HashFunctionFamily::new(collection.dimensionality(), bucket_width, config.seed);
        let powers = Arc::new(ModularPowers::with_defaults(config.hashes_per_table));

        let tables = (0..config.num_tables)
            .map(|t| {
                Ok(HashTable {
                    hash: AmplifiedHash::random(&family, config.hashes_per_table, t, powers.clone())?,
                    buckets: HashMap::new(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            tables = config.num_tables,
            k = config.hashes_per_table,
            bucket_width,
            "created amplified-hash index"
        );

        Ok(Self {
            collection,
            config,
            bucket_width,
            powers,
            tables,
            indexed: HashSet::new(),
        })
    }

    /// Tables are independent, so bulk insertion fills them in parallel.
    /// Records already in the index are skipped.
    fn insert_all(&mut self, records: &[&VectorRecord]) {
        let fresh: Vec<&VectorRecord> = records
            .iter()
            .copied()
            .filter(|record| self.indexed.insert(record.id()))
            .collect();
        self.tables.par_iter_mut().for_each(|table| {
            for record in &fresh {
                table.insert(record);
            }
        });
    }

    /// Add one record of the backing collection to all `L` tables.
    ///
    /// Returns `false`, leaving the tables untouched, if `id` is already
    /// indexed.
    pub fn insert(&mut self, id: RecordId) -> Result<bool> {
        let record = self.collection.record(id)?;
        if !self.indexed.insert(id) {
            return Ok(false);
        }
        for table in &mut self.tables {
            table.insert(record);
        }
        Ok(true)
    }

    /// Check if `id` is indexed.
    pub fn contains(&self, id: RecordId) -> bool {
        self.indexed.contains(&id)
    }

    /// Number of indexed records.
    pub fn len(&self) -> usize {
        self.indexed.len()
    }

    /// Check if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.indexed.is_empty()
    }

    /// Number of tables (L).
    pub fn num_tables(&self) -> usize {
        self.tables.len()
    }

    /// Bucket width in use (configured or estimated).
    pub fn bucket_width(&self) -> f32 {
        self.bucket_width
    }

    /// Configuration the index was built with.
    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    /// Power table shared by every table.
    pub fn modular_powers(&self) -> &Arc<ModularPowers> {
        &self.powers
    }

    /// The collection the identifiers resolve against.
    pub fn collection(&self) -> &'a RecordCollection {
        self.collection
    }

    /// Distinct identifiers sharing a bucket with `query`, in table order and
    /// then insertion order within each bucket.
    pub fn candidates(&self, query: &[f32]) -> Result<Vec<RecordId>> {
        self.collection.check_dimensionality(query)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for table in &self.tables {
            for &id in table.bucket(query) {
                if seen.insert(id) {
                    out.push(id);
                }
            }
        }
        Ok(out)
    }

    /// All indexed records within `radius` of `query`, excluding `exclude`.
    ///
    /// Results are ordered by record id. An empty result is a normal
    /// outcome: the query may hash to unpopulated buckets in every table.
    pub fn range_query(
        &self,
        query: &[f32],
        radius: f32,
        exclude: &HashSet<RecordId>,
    ) -> Result<NNResultsVector> {
        let mut results: NNResultsVector = self
            .candidates(query)?
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .filter_map(|id| {
                let record = self.collection.get(id)?;
                let d = l2(query, record.coordinates());
                (d <= radius).then_some((id, d))
            })
            .collect();

        if results.is_empty() {
            trace!(radius, "range query found no candidates");
        }
        results.sort_unstable_by_key(|&(id, _)| id);
        Ok(results)
    }

    /// Approximate nearest neighbor of `query`.
    ///
    /// Examines at most `max_candidates` distinct candidates in
    /// [`candidates`](Self::candidates) order and returns the closest one,
    /// ties going to the smaller id. `None` when every bucket is empty.
    pub fn nearest_neighbor(&self, query: &[f32], max_candidates: usize) -> Result<Option<Neighbor>> {
        if max_candidates == 0 {
            return Err(HashClustError::configuration("max_candidates must be > 0"));
        }
        let mut best: Option<Neighbor> = None;
        for id in self.candidates(query)?.into_iter().take(max_candidates) {
            let Some(record) = self.collection.get(id) else {
                continue;
            };
            let candidate = Neighbor::new(id, l2(query, record.coordinates()));
            if best.map_or(true, |b| candidate.is_better_than(&b)) {
                best = Some(candidate);
            }
        }
        Ok(best)
    }
}
