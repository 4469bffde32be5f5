//! Assignment strategies.
//!
//! An [`Assigner`] maps every record of a collection to its (approximately)
//! nearest centroid. [`BruteForceAssigner`] scans all centroids per record.
//! [`ReverseAssigner`] works the other way round: every centroid issues a
//! range query against an index, and the radius doubles until all records are
//! claimed or the doubling budget runs out. Whatever is left after that goes
//! through the exact scan, so every pass labels every record.

use crate::brute_force::nearest_centroid;
use crate::config::{HypercubeConfig, LshConfig, RangeSearchConfig};
use crate::data_format::RecordCollection;
use crate::distance_measures::l2;
use crate::error::{HashClustError, Result};
use crate::hashes::{AmplifiedHashIndex, HypercubeIndex};
use crate::types::{NNResultsVector, RecordId};
use crate::utils::parallel::maybe_parallel_map_threshold;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Batches smaller than this are labelled on the calling thread.
const ASSIGN_PARALLEL_THRESHOLD: usize = 512;

/// Labels produced by one assignment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPass {
    /// Cluster index of every record, by collection position.
    pub labels: Vec<usize>,

    /// Records claimed through index range queries.
    pub claimed: usize,

    /// Records labelled by the exact fallback scan.
    pub fallback: usize,

    /// Range query rounds issued (0 for exact assignment).
    pub rounds: usize,
}

/// A strategy mapping every record to a centroid.
pub trait Assigner: Send + Sync {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    /// Label every record of the collection with a centroid index.
    fn assign(&self, centroids: &[Vec<f32>]) -> Result<AssignmentPass>;
}

fn check_centroids(collection: &RecordCollection, centroids: &[Vec<f32>]) -> Result<()> {
    if centroids.is_empty() {
        return Err(HashClustError::configuration("assignment needs at least one centroid"));
    }
    centroids
        .iter()
        .try_for_each(|c| collection.check_dimensionality(c))
}

/// Exact nearest centroid for every position in `positions`.
fn exact_labels(collection: &RecordCollection, positions: &[usize], centroids: &[Vec<f32>]) -> Vec<usize> {
    maybe_parallel_map_threshold(positions, ASSIGN_PARALLEL_THRESHOLD, |&p| {
        nearest_centroid(collection.at(p).coordinates(), centroids)
            .map(|(c, _)| c)
            .unwrap_or(0)
    })
}

/// Exact assignment: the nearest centroid of every record.
pub struct BruteForceAssigner<'a> {
    collection: &'a RecordCollection,
}

impl<'a> BruteForceAssigner<'a> {
    /// Create an assigner over `collection`.
    pub fn new(collection: &'a RecordCollection) -> Self {
        Self { collection }
    }
}

impl Assigner for BruteForceAssigner<'_> {
    fn name(&self) -> &'static str {
        "brute_force"
    }

    fn assign(&self, centroids: &[Vec<f32>]) -> Result<AssignmentPass> {
        check_centroids(self.collection, centroids)?;
        let positions: Vec<usize> = (0..self.collection.len()).collect();
        let labels = exact_labels(self.collection, &positions, centroids);
        Ok(AssignmentPass {
            fallback: labels.len(),
            labels,
            claimed: 0,
            rounds: 0,
        })
    }
}

/// An index answering radius queries over record identifiers.
pub trait RangeIndex: Sync {
    /// Short index name for logs.
    fn kind(&self) -> &'static str;

    /// Indexed records within `radius` of `query`, skipping `exclude`.
    fn range_query(
        &self,
        query: &[f32],
        radius: f32,
        exclude: &HashSet<RecordId>,
    ) -> Result<NNResultsVector>;

    /// A distance scale to start searching from when nothing better is known.
    fn distance_scale(&self) -> f32;
}

impl RangeIndex for AmplifiedHashIndex<'_> {
    fn kind(&self) -> &'static str {
        "lsh"
    }

    fn range_query(
        &self,
        query: &[f32],
        radius: f32,
        exclude: &HashSet<RecordId>,
    ) -> Result<NNResultsVector> {
        AmplifiedHashIndex::range_query(self, query, radius, exclude)
    }

    fn distance_scale(&self) -> f32 {
        self.bucket_width()
    }
}

impl RangeIndex for HypercubeIndex<'_> {
    fn kind(&self) -> &'static str {
        "hypercube"
    }

    fn range_query(
        &self,
        query: &[f32],
        radius: f32,
        exclude: &HashSet<RecordId>,
    ) -> Result<NNResultsVector> {
        self.range_query_default(query, radius, exclude)
    }

    fn distance_scale(&self) -> f32 {
        self.bucket_width()
    }
}

/// Reverse assignment through range queries on an index.
///
/// Within one round every centroid queries in parallel and each record keeps
/// the nearest centroid that found it (ties: smaller cluster index), so the
/// result does not depend on the order the centroids are processed in.
/// Records claimed in a round are excluded from later rounds.
pub struct ReverseAssigner<'a, I> {
    collection: &'a RecordCollection,
    index: I,
    range: RangeSearchConfig,
}

/// Reverse assignment backed by an amplified-hash index.
pub type LshAssigner<'a> = ReverseAssigner<'a, AmplifiedHashIndex<'a>>;

/// Reverse assignment backed by a hypercube index.
pub type HypercubeAssigner<'a> = ReverseAssigner<'a, HypercubeIndex<'a>>;

impl<'a> ReverseAssigner<'a, AmplifiedHashIndex<'a>> {
    /// Build an amplified-hash index over `collection` and wrap it.
    pub fn lsh(collection: &'a RecordCollection, lsh: LshConfig, range: RangeSearchConfig) -> Result<Self> {
        let index = AmplifiedHashIndex::build(collection, lsh)?;
        Ok(Self::new(collection, index, range))
    }
}

impl<'a> ReverseAssigner<'a, HypercubeIndex<'a>> {
    /// Build a hypercube index over `collection` and wrap it.
    pub fn hypercube(
        collection: &'a RecordCollection,
        hypercube: HypercubeConfig,
        range: RangeSearchConfig,
    ) -> Result<Self> {
        let index = HypercubeIndex::build(collection, hypercube)?;
        Ok(Self::new(collection, index, range))
    }
}

impl<'a, I: RangeIndex> ReverseAssigner<'a, I> {
    /// Wrap an index built over every record of `collection`.
    pub fn new(collection: &'a RecordCollection, index: I, range: RangeSearchConfig) -> Self {
        Self {
            collection,
            index,
            range,
        }
    }

    /// The backing index.
    pub fn index(&self) -> &I {
        &self.index
    }

    /// Starting radius: the configured one, else half the smallest distance
    /// between two centroids, else the index's distance scale.
    fn starting_radius(&self, centroids: &[Vec<f32>]) -> f32 {
        if let Some(r) = self.range.initial_radius {
            return r;
        }
        let mut min_dist = f32::INFINITY;
        for (i, a) in centroids.iter().enumerate() {
            for b in &centroids[i + 1..] {
                min_dist = min_dist.min(l2(a, b));
            }
        }
        let radius = min_dist / 2.0;
        if radius.is_finite() && radius > 0.0 {
            return radius;
        }
        let scale = self.index.distance_scale();
        if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        }
    }
}

impl<I: RangeIndex + Send> Assigner for ReverseAssigner<'_, I> {
    fn name(&self) -> &'static str {
        self.index.kind()
    }

    fn assign(&self, centroids: &[Vec<f32>]) -> Result<AssignmentPass> {
        check_centroids(self.collection, centroids)?;

        let n = self.collection.len();
        let mut labels: Vec<Option<usize>> = vec![None; n];
        let mut finalized: HashSet<RecordId> = HashSet::with_capacity(n);
        let mut radius = self.starting_radius(centroids);
        let mut rounds = 0;

        for round in 0..=self.range.max_doublings {
            if finalized.len() == n {
                break;
            }
            if round > 0 {
                radius *= 2.0;
            }
            rounds += 1;

            let hits: Vec<NNResultsVector> = centroids
                .par_iter()
                .map(|c| self.index.range_query(c, radius, &finalized))
                .collect::<Result<_>>()?;

            let mut best: HashMap<RecordId, (f32, usize)> = HashMap::new();
            for (cluster, found) in hits.iter().enumerate() {
                for &(id, d) in found {
                    best.entry(id)
                        .and_modify(|b| {
                            if d < b.0 {
                                *b = (d, cluster);
                            }
                        })
                        .or_insert((d, cluster));
                }
            }

            if best.is_empty() {
                debug!(round, radius, "range queries claimed no records");
            }
            for (id, (_, cluster)) in best {
                if let Some(pos) = self.collection.position(id) {
                    labels[pos] = Some(cluster);
                    finalized.insert(id);
                }
            }
            debug!(round, radius, claimed = finalized.len(), total = n, "reverse assignment round");
        }

        let claimed = finalized.len();
        let unassigned: Vec<usize> = (0..n).filter(|&p| labels[p].is_none()).collect();
        if !unassigned.is_empty() {
            warn!(
                strategy = self.index.kind(),
                records = unassigned.len(),
                "assigning unclaimed records by exact scan"
            );
            let fallback = exact_labels(self.collection, &unassigned, centroids);
            for (&p, c) in unassigned.iter().zip(fallback) {
                labels[p] = Some(c);
            }
        }

        Ok(AssignmentPass {
            labels: labels.into_iter().map(|l| l.unwrap_or(0)).collect(),
            claimed,
            fallback: unassigned.len(),
            rounds,
        })
    }
}
