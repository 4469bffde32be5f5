//! Hypercube projection index.
//!
//! `k` binary hash functions map every record to a vertex of the
//! `k`-dimensional hypercube. Queries probe the query's own vertex first and
//! then its neighbors in increasing Hamming distance; within one distance,
//! vertices are visited in ascending order of the flipped-bit mask, so probe
//! order is fixed for a given query code.

use crate::config::HypercubeConfig;
use crate::data_format::{RecordCollection, VectorRecord};
use crate::distance_measures::l2;
use crate::error::{HashClustError, Result};
use crate::hashes::hash_function::{
    estimate_bucket_width, HashFunction, HashFunctionFamily, BUCKET_WIDTH_SAMPLE_SIZE,
};
use crate::types::{Neighbor, NNResultsVector, RecordId};
use crate::utils::bits::HammingMasks;
use std::collections::{HashMap, HashSet};
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// Vertex code of a hypercube with at most 32 dimensions.
pub type VertexCode = u32;

/// Hypercube index over (a subset of) one record collection.
#[derive(Debug, Clone)]
pub struct HypercubeIndex<'a> {
    collection: &'a RecordCollection,
    config: HypercubeConfig,
    bucket_width: f32,
    functions: Vec<HashFunction>,
    vertices: HashMap<VertexCode, Vec<RecordId>>,
    indexed: HashSet<RecordId>,
}

impl<'a> HypercubeIndex<'a> {
    /// Build an index over every record of `collection`.
    pub fn build(collection: &'a RecordCollection, config: HypercubeConfig) -> Result<Self> {
        let mut index = Self::empty(collection, config)?;
        for record in collection {
            index.insert_record(record);
        }
        Ok(index)
    }

    /// Build an index over the records of `collection` named by `ids`.
    pub fn build_subset(
        collection: &'a RecordCollection,
        ids: &[RecordId],
        config: HypercubeConfig,
    ) -> Result<Self> {
        let mut index = Self::empty(collection, config)?;
        for &id in ids {
            index.insert(id)?;
        }
        Ok(index)
    }

    /// Create an index with no records.
    pub fn empty(collection: &'a RecordCollection, config: HypercubeConfig) -> Result<Self> {
        config.validate()?;

        let bucket_width = config
            .bucket_width
            .unwrap_or_else(|| estimate_bucket_width(collection, BUCKET_WIDTH_SAMPLE_SIZE, config.seed));
        let family = HashFunctionFamily::new(collection.dimensionality(), bucket_width, config.seed);
        let functions = family.build(config.dimensions, 0);

        debug!(
            dimensions = config.dimensions,
            max_points = config.max_points,
            max_probes = config.max_probes,
            "created hypercube index"
        );

        Ok(Self {
            collection,
            config,
            bucket_width,
            functions,
            vertices: HashMap::new(),
            indexed: HashSet::new(),
        })
    }

    fn insert_record(&mut self, record: &VectorRecord) -> bool {
        if !self.indexed.insert(record.id()) {
            return false;
        }
        let code = self.vertex_code(record.coordinates());
        self.vertices.entry(code).or_default().push(record.id());
        true
    }

    /// Add one record of the backing collection.
    ///
    /// Returns `false`, leaving the vertices untouched, if `id` is already
    /// indexed.
    pub fn insert(&mut self, id: RecordId) -> Result<bool> {
        let record = self.collection.record(id)?;
        Ok(self.insert_record(record))
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

    /// Number of populated vertices.
    pub fn num_occupied_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Configuration the index was built with.
    pub fn config(&self) -> &HypercubeConfig {
        &self.config
    }

    /// Bucket width in use (configured or estimated).
    pub fn bucket_width(&self) -> f32 {
        self.bucket_width
    }

    /// Vertex code of `x`: bit `i` is set when `x` lies on the positive side
    /// of hyperplane `i`.
    pub fn vertex_code(&self, x: &[f32]) -> VertexCode {
        self.functions
            .iter()
            .enumerate()
            .fold(0, |code, (i, h)| if h.bit(x) { code | (1 << i) } else { code })
    }

    /// Vertices in the order a query at `code` probes them.
    pub fn probe_sequence(&self, code: VertexCode) -> impl Iterator<Item = VertexCode> {
        HammingMasks::new(self.config.dimensions).map(move |mask| code ^ mask as VertexCode)
    }

    /// Visit candidates of `query` within the probe and point budgets.
    ///
    /// Excluded identifiers are skipped without counting against `max_points`.
    fn probe<F>(
        &self,
        query: &[f32],
        max_points: usize,
        max_probes: usize,
        exclude: &HashSet<RecordId>,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(RecordId, f32),
    {
        self.collection.check_dimensionality(query)?;
        if max_points == 0 || max_probes == 0 {
            return Err(HashClustError::configuration(
                "hypercube max_points and max_probes must be > 0",
            ));
        }

        let mut examined = 0usize;
        let code = self.vertex_code(query);
        let flow = self.probe_sequence(code).take(max_probes).try_for_each(|vertex| {
            let Some(bucket) = self.vertices.get(&vertex) else {
                return ControlFlow::Continue(());
            };
            for &id in bucket {
                if exclude.contains(&id) {
                    continue;
                }
                if examined == max_points {
                    return ControlFlow::Break(());
                }
                examined += 1;
                if let Some(record) = self.collection.get(id) {
                    visit(id, l2(query, record.coordinates()));
                }
            }
            ControlFlow::Continue(())
        });

        trace!(examined, stopped_early = flow.is_break(), "hypercube probe finished");
        Ok(())
    }

    /// Records within `radius` of `query`, excluding `exclude`, found within
    /// the given budgets. Results are ordered by record id.
    pub fn range_query(
        &self,
        query: &[f32],
        radius: f32,
        max_points: usize,
        max_probes: usize,
        exclude: &HashSet<RecordId>,
    ) -> Result<NNResultsVector> {
        let mut results = Vec::new();
        self.probe(query, max_points, max_probes, exclude, |id, d| {
            if d <= radius {
                results.push((id, d));
            }
        })?;
        results.sort_unstable_by_key(|&(id, _)| id);
        Ok(results)
    }

    /// Approximate nearest neighbor within the given budgets; ties go to the
    /// smaller id.
    pub fn nearest_neighbor(
        &self,
        query: &[f32],
        max_points: usize,
        max_probes: usize,
    ) -> Result<Option<Neighbor>> {
        let mut best: Option<Neighbor> = None;
        self.probe(query, max_points, max_probes, &HashSet::new(), |id, d| {
            let candidate = Neighbor::new(id, d);
            if best.map_or(true, |b| candidate.is_better_than(&b)) {
                best = Some(candidate);
            }
        })?;
        Ok(best)
    }

    /// [`range_query`](Self::range_query) with the configured budgets.
    pub fn range_query_default(
        &self,
        query: &[f32],
        radius: f32,
        exclude: &HashSet<RecordId>,
    ) -> Result<NNResultsVector> {
        self.range_query(query, radius, self.config.max_points, self.config.max_probes, exclude)
    }

    /// [`nearest_neighbor`](Self::nearest_neighbor) with the configured budgets.
    pub fn nearest_neighbor_default(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        self.nearest_neighbor(query, self.config.max_points, self.config.max_probes)
    }
}
