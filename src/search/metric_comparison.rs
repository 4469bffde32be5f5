//! Earth mover's versus Manhattan nearest neighbors.
//!
//! Both metrics retrieve the `k` nearest records of every query image. Each
//! metric is then scored by the fraction of its neighbors whose label equals
//! the query's label. Labels only score the answers; retrieval never sees
//! them.

use crate::brute_force::TopK;
use crate::config::EmdSearchConfig;
use crate::data_format::{RecordCollection, VectorRecord};
use crate::distance_measures::{l1, EarthMoverDistance};
use crate::error::{HashClustError, Result};
use crate::types::RecordId;
use crate::utils::parallel::maybe_parallel_map_threshold;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Query count from which queries are answered in parallel.
const QUERY_PARALLEL_THRESHOLD: usize = 4;

/// Record count from which signatures are computed in parallel.
const SIGNATURE_PARALLEL_THRESHOLD: usize = 256;

/// Neighbors of one query under both metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryComparison {
    /// Query identifier.
    pub query: RecordId,

    /// Label of the query.
    pub label: u32,

    /// Earth mover's neighbors, closest first.
    pub emd_neighbors: Vec<RecordId>,

    /// Manhattan neighbors, closest first.
    pub manhattan_neighbors: Vec<RecordId>,

    /// Fraction of `emd_neighbors` labelled like the query.
    pub emd_correct: f64,

    /// Fraction of `manhattan_neighbors` labelled like the query.
    pub manhattan_correct: f64,
}

/// Per-query comparisons and their means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// One entry per query, in query order.
    pub queries: Vec<QueryComparison>,

    /// Mean of `emd_correct`; `None` without queries.
    pub mean_emd_correct: Option<f64>,

    /// Mean of `manhattan_correct`; `None` without queries.
    pub mean_manhattan_correct: Option<f64>,
}

impl ComparisonReport {
    /// Summarize `queries`.
    pub fn new(queries: Vec<QueryComparison>) -> Self {
        let mean = |f: fn(&QueryComparison) -> f64| {
            (!queries.is_empty()).then(|| queries.iter().map(f).sum::<f64>() / queries.len() as f64)
        };
        let mean_emd_correct = mean(|q| q.emd_correct);
        let mean_manhattan_correct = mean(|q| q.manhattan_correct);
        Self {
            queries,
            mean_emd_correct,
            mean_manhattan_correct,
        }
    }
}

/// Labelled image collection searched under both metrics.
pub struct MetricComparison<'a> {
    collection: &'a RecordCollection,
    labels: &'a [u32],
    emd: EarthMoverDistance,
    signatures: Vec<Vec<f64>>,
    config: EmdSearchConfig,
}

impl<'a> MetricComparison<'a> {
    /// Prepare `collection`, whose record at position `i` carries `labels[i]`.
    pub fn new(collection: &'a RecordCollection, labels: &'a [u32], config: EmdSearchConfig) -> Result<Self> {
        config.validate()?;
        if labels.len() != collection.len() {
            return Err(HashClustError::correspondence(format!(
                "{} labels for {} records",
                labels.len(),
                collection.len()
            )));
        }
        let emd = EarthMoverDistance::new(config.grid()?);
        if emd.grid().dimensionality() != collection.dimensionality() {
            return Err(HashClustError::dimension_mismatch(
                emd.grid().dimensionality(),
                collection.dimensionality(),
            ));
        }

        let signatures = maybe_parallel_map_threshold(collection.records(), SIGNATURE_PARALLEL_THRESHOLD, |r| {
            emd.grid().signature(r.coordinates())
        })
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        debug!(
            records = collection.len(),
            windows = emd.grid().num_windows(),
            "prepared metric comparison"
        );
        Ok(Self {
            collection,
            labels,
            emd,
            signatures,
            config,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &EmdSearchConfig {
        &self.config
    }

    fn label_of(&self, id: RecordId) -> Option<u32> {
        self.collection.position(id).map(|p| self.labels[p])
    }

    fn fraction_labelled(&self, neighbors: &[RecordId], label: u32) -> f64 {
        if neighbors.is_empty() {
            return 0.0;
        }
        let hits = neighbors.iter().filter(|&&id| self.label_of(id) == Some(label)).count();
        hits as f64 / neighbors.len() as f64
    }

    /// Nearest records of `query` by earth mover's distance; ties go to the
    /// smaller id.
    pub fn emd_neighbors(&self, query: &[f32]) -> Result<Vec<RecordId>> {
        let signature = self.emd.grid().signature(query)?;
        let mut top_k = TopK::new(self.config.neighbors);
        for (record, other) in self.collection.iter().zip(&self.signatures) {
            top_k.push(record.id(), self.emd.between_signatures(&signature, other) as f32);
        }
        Ok(top_k.drain_sorted().into_iter().map(|(id, _)| id).collect())
    }

    /// Nearest records of `query` by Manhattan distance; ties go to the
    /// smaller id.
    pub fn manhattan_neighbors(&self, query: &[f32]) -> Result<Vec<RecordId>> {
        self.collection.check_dimensionality(query)?;
        let mut top_k = TopK::new(self.config.neighbors);
        for record in self.collection {
            top_k.push(record.id(), l1(query, record.coordinates()));
        }
        Ok(top_k.drain_sorted().into_iter().map(|(id, _)| id).collect())
    }

    /// Compare both metrics on one labelled query.
    pub fn query(&self, id: RecordId, query: &[f32], label: u32) -> Result<QueryComparison> {
        let emd_neighbors = self.emd_neighbors(query)?;
        let manhattan_neighbors = self.manhattan_neighbors(query)?;
        let emd_correct = self.fraction_labelled(&emd_neighbors, label);
        let manhattan_correct = self.fraction_labelled(&manhattan_neighbors, label);
        debug!(query = id, emd_correct, manhattan_correct, "compared metrics");
        Ok(QueryComparison {
            query: id,
            label,
            emd_neighbors,
            manhattan_neighbors,
            emd_correct,
            manhattan_correct,
        })
    }

    /// Compare both metrics on every query; `query_labels[i]` labels the
    /// query at position `i`.
    pub fn run(&self, queries: &RecordCollection, query_labels: &[u32]) -> Result<ComparisonReport> {
        if query_labels.len() != queries.len() {
            return Err(HashClustError::correspondence(format!(
                "{} labels for {} queries",
                query_labels.len(),
                queries.len()
            )));
        }
        let labelled: Vec<(&VectorRecord, u32)> = queries.iter().zip(query_labels.iter().copied()).collect();
        let comparisons = maybe_parallel_map_threshold(&labelled, QUERY_PARALLEL_THRESHOLD, |&(q, label)| {
            self.query(q.id(), q.coordinates(), label)
        })
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        let report = ComparisonReport::new(comparisons);
        info!(
            queries = report.queries.len(),
            emd = report.mean_emd_correct,
            manhattan = report.mean_manhattan_correct,
            "metric comparison finished"
        );
        Ok(report)
    }
}
