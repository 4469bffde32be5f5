//! Cross-space nearest neighbor comparison.
//!
//! For every query this measures three answers, all with distances in the
//! original space:
//!
//! - the approximate neighbor returned by an amplified-hash index,
//! - the exact neighbor found by brute force,
//! - the exact neighbor in a reduced space, re-measured in the original space.
//!
//! The ratios to the exact distance show how much the approximate index and
//! the reduced representation lose.

use crate::brute_force::BruteForceSearcher;
use crate::config::SearchConfig;
use crate::data_format::RecordCollection;
use crate::distance_measures::l2;
use crate::error::Result;
use crate::hashes::AmplifiedHashIndex;
use crate::types::{Neighbor, RecordId};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Results of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    /// Query identifier.
    pub query: RecordId,

    /// Approximate neighbor from the index. `None` if every probed bucket was empty.
    pub lsh: Option<Neighbor>,

    /// Exact neighbor in the original space.
    pub exact: Option<Neighbor>,

    /// Exact neighbor in the reduced space, with its original-space distance.
    pub reduced: Option<Neighbor>,

    /// Time spent in the index lookup.
    pub lsh_time: Duration,

    /// Time spent in the exact scan.
    pub exact_time: Duration,

    /// Time spent in the reduced-space scan.
    pub reduced_time: Duration,
}

/// `found / exact`, when both exist and the exact distance is positive.
fn ratio(found: Option<Neighbor>, exact: Option<Neighbor>) -> Option<f64> {
    match (found, exact) {
        (Some(f), Some(e)) if e.distance > 0.0 => Some(f.distance as f64 / e.distance as f64),
        _ => None,
    }
}

impl QueryReport {
    /// Approximation factor of the index answer.
    pub fn lsh_factor(&self) -> Option<f64> {
        ratio(self.lsh, self.exact)
    }

    /// Approximation factor of the reduced-space answer.
    pub fn reduced_factor(&self) -> Option<f64> {
        ratio(self.reduced, self.exact)
    }
}

/// Results of a batch of queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    /// Per-query results in query order.
    pub queries: Vec<QueryReport>,

    /// Mean index approximation factor over queries where it is defined.
    pub mean_lsh_factor: Option<f64>,

    /// Mean reduced-space approximation factor over queries where it is defined.
    pub mean_reduced_factor: Option<f64>,
}

impl SearchReport {
    /// Summarize per-query reports.
    pub fn new(queries: Vec<QueryReport>) -> Self {
        let mean = |f: fn(&QueryReport) -> Option<f64>| {
            let values: Vec<f64> = queries.iter().filter_map(f).collect();
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };
        let mean_lsh_factor = mean(QueryReport::lsh_factor);
        let mean_reduced_factor = mean(QueryReport::reduced_factor);
        Self {
            queries,
            mean_lsh_factor,
            mean_reduced_factor,
        }
    }
}

/// Compares index, exact and reduced-space answers over paired collections.
pub struct CrossSpaceSearcher<'a> {
    original: &'a RecordCollection,
    reduced: &'a RecordCollection,
    index: AmplifiedHashIndex<'a>,
    config: SearchConfig,
}

impl<'a> CrossSpaceSearcher<'a> {
    /// Index `original` and pair it with `reduced`, which must hold the same
    /// identifiers.
    pub fn new(
        original: &'a RecordCollection,
        reduced: &'a RecordCollection,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;
        original.check_correspondence(reduced)?;
        let index = AmplifiedHashIndex::build(original, config.lsh.clone())?;
        Ok(Self {
            original,
            reduced,
            index,
            config,
        })
    }

    /// The index over the original space.
    pub fn index(&self) -> &AmplifiedHashIndex<'a> {
        &self.index
    }

    /// Answer one query given in both spaces.
    pub fn query(&self, id: RecordId, original_query: &[f32], reduced_query: &[f32]) -> Result<QueryReport> {
        let start = Instant::now();
        let lsh = self.index.nearest_neighbor(original_query, self.config.candidate_budget())?;
        let lsh_time = start.elapsed();

        let start = Instant::now();
        let exact = BruteForceSearcher::new(self.original).nearest(original_query)?;
        let exact_time = start.elapsed();

        let start = Instant::now();
        let reduced_hit = BruteForceSearcher::new(self.reduced).nearest(reduced_query)?;
        let reduced_time = start.elapsed();
        let reduced = reduced_hit
            .map(|n| -> Result<Neighbor> {
                let record = self.original.record(n.id)?;
                Ok(Neighbor::new(n.id, l2(original_query, record.coordinates())))
            })
            .transpose()?;

        debug!(query = id, ?lsh, ?exact, ?reduced, "answered query");
        Ok(QueryReport {
            query: id,
            lsh,
            exact,
            reduced,
            lsh_time,
            exact_time,
            reduced_time,
        })
    }

    /// Answer every query. Both query collections must hold the same
    /// identifiers; queries run in the order of `original_queries`.
    pub fn run(
        &self,
        original_queries: &RecordCollection,
        reduced_queries: &RecordCollection,
    ) -> Result<SearchReport> {
        original_queries.check_correspondence(reduced_queries)?;
        let reports = original_queries
            .iter()
            .map(|q| {
                let reduced = reduced_queries.record(q.id())?;
                self.query(q.id(), q.coordinates(), reduced.coordinates())
            })
            .collect::<Result<Vec<_>>>()?;
        let report = SearchReport::new(reports);
        info!(
            queries = report.queries.len(),
            lsh_factor = report.mean_lsh_factor,
            reduced_factor = report.mean_reduced_factor,
            "search finished"
        );
        Ok(report)
    }
}
