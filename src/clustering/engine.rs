//! The k-means clustering engine.
//!
//! The engine is an explicit state machine:
//!
//! ```text
//! Init -> Assign -> Update -> Assign -> ... -> Converged | Exhausted
//! ```
//!
//! [`ClusteringEngine::step`] advances one phase, and [`ClusteringEngine::run`]
//! steps until a terminal phase. If a step fails, the engine keeps the state
//! reached so far and [`ClusteringEngine::snapshot`] still reports it.

use crate::clustering::assign::{Assigner, BruteForceAssigner, HypercubeAssigner, LshAssigner};
use crate::clustering::cluster::{Cluster, ClusteringResult};
use crate::clustering::init::initial_centroids;
use crate::clustering::reseed::reseed_empty_clusters;
use crate::config::{AssignmentMethod, ClusteringConfig};
use crate::data_format::RecordCollection;
use crate::distance_measures::{componentwise_mean, l2, squared_l2};
use crate::error::{HashClustError, Result};
use crate::utils::random::RandomSampler;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Phase of a clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial centroids not chosen yet.
    Init,
    /// Next step labels every record.
    Assign,
    /// Next step recomputes centroids.
    Update,
    /// Stopped on stable memberships or small centroid movement.
    Converged,
    /// Stopped at the iteration cap.
    Exhausted,
}

impl Phase {
    /// Check whether the run has stopped.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Converged | Phase::Exhausted)
    }
}

/// k-means over one record collection with a pluggable assignment strategy.
pub struct ClusteringEngine<'a> {
    collection: &'a RecordCollection,
    config: ClusteringConfig,
    assigner: Box<dyn Assigner + 'a>,
    sampler: RandomSampler,
    phase: Phase,
    centroids: Vec<Vec<f32>>,
    /// Cluster index of every record, by collection position.
    labels: Vec<usize>,
    has_labels: bool,
    iterations: usize,
    objective_history: Vec<f64>,
    reseeds: usize,
}

impl<'a> ClusteringEngine<'a> {
    /// Create an engine using the assignment strategy named in `config`.
    pub fn new(collection: &'a RecordCollection, config: ClusteringConfig) -> Result<Self> {
        config.validate(collection.len())?;
        let assigner: Box<dyn Assigner + 'a> = match config.assignment {
            AssignmentMethod::Lloyd => Box::new(BruteForceAssigner::new(collection)),
            AssignmentMethod::Lsh => Box::new(LshAssigner::lsh(
                collection,
                config.lsh.clone(),
                config.range_search.clone(),
            )?),
            AssignmentMethod::Hypercube => Box::new(HypercubeAssigner::hypercube(
                collection,
                config.hypercube.clone(),
                config.range_search.clone(),
            )?),
        };
        Self::with_assigner(collection, config, assigner)
    }

    /// Create an engine with a caller-supplied assignment strategy.
    pub fn with_assigner(
        collection: &'a RecordCollection,
        config: ClusteringConfig,
        assigner: Box<dyn Assigner + 'a>,
    ) -> Result<Self> {
        config.validate(collection.len())?;
        debug!(
            k = config.num_clusters,
            records = collection.len(),
            strategy = assigner.name(),
            "created clustering engine"
        );
        Ok(Self {
            collection,
            sampler: RandomSampler::with_seed(config.seed),
            config,
            assigner,
            phase: Phase::Init,
            centroids: Vec::new(),
            labels: vec![0; collection.len()],
            has_labels: false,
            iterations: 0,
            objective_history: Vec::new(),
            reseeds: 0,
        })
    }

    /// Skip the init policy and start from the given centroids.
    ///
    /// The centroids must be K pairwise distinct vectors of the collection's
    /// dimensionality. Only valid before the first step.
    pub fn with_centroids(mut self, centroids: Vec<Vec<f32>>) -> Result<Self> {
        if self.phase != Phase::Init {
            return Err(HashClustError::configuration("centroids can only be set before the first step"));
        }
        if centroids.len() != self.config.num_clusters {
            return Err(HashClustError::configuration(format!(
                "expected {} centroids, got {}",
                self.config.num_clusters,
                centroids.len()
            )));
        }
        for (i, c) in centroids.iter().enumerate() {
            self.collection.check_dimensionality(c)?;
            if centroids[..i].contains(c) {
                return Err(HashClustError::configuration("initial centroids must be distinct"));
            }
        }
        self.centroids = centroids;
        self.phase = Phase::Assign;
        Ok(self)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Assignment passes performed so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Current centroids (empty before init).
    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }

    /// Objective value after every completed update.
    pub fn objective_history(&self) -> &[f64] {
        &self.objective_history
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Advance one phase and return the new phase.
    ///
    /// Terminal phases are left unchanged.
    pub fn step(&mut self) -> Result<Phase> {
        self.phase = match self.phase {
            Phase::Init => self.init()?,
            Phase::Assign => self.assign()?,
            Phase::Update => self.update(),
            terminal => terminal,
        };
        Ok(self.phase)
    }

    /// Step until the run stops, then return the result.
    pub fn run(&mut self) -> Result<ClusteringResult> {
        while !self.phase.is_terminal() {
            self.step()?;
        }
        let result = self.snapshot();
        info!(
            iterations = result.iterations,
            converged = result.converged,
            objective = result.final_objective(),
            reseeds = result.reseeds,
            "clustering finished"
        );
        Ok(result)
    }

    /// The clusters as of the current state.
    ///
    /// Before the first assignment every cluster is empty.
    pub fn snapshot(&self) -> ClusteringResult {
        let mut members = vec![BTreeSet::new(); self.centroids.len()];
        if self.has_labels {
            for (record, &label) in self.collection.iter().zip(&self.labels) {
                members[label].insert(record.id());
            }
        }
        let clusters = self
            .centroids
            .iter()
            .zip(members)
            .enumerate()
            .map(|(id, (centroid, members))| Cluster::new(id, centroid.clone(), members))
            .collect();
        ClusteringResult {
            clusters,
            iterations: self.iterations,
            converged: self.phase == Phase::Converged,
            objective_history: self.objective_history.clone(),
            reseeds: self.reseeds,
        }
    }

    fn init(&mut self) -> Result<Phase> {
        self.centroids = initial_centroids(
            self.collection,
            self.config.num_clusters,
            self.config.init,
            &mut self.sampler,
        )?;
        Ok(Phase::Assign)
    }

    fn assign(&mut self) -> Result<Phase> {
        let pass = self.assigner.assign(&self.centroids)?;
        self.iterations += 1;

        let changed = if self.has_labels {
            self.labels.iter().zip(&pass.labels).filter(|(a, b)| a != b).count()
        } else {
            self.labels.len()
        };
        self.labels = pass.labels;
        let first_pass = !self.has_labels;
        self.has_labels = true;

        debug!(
            iteration = self.iterations,
            changed,
            claimed = pass.claimed,
            fallback = pass.fallback,
            rounds = pass.rounds,
            "assignment pass"
        );

        // Unchanged memberships keep the centroids computed from them.
        if !first_pass && changed == 0 {
            return Ok(Phase::Converged);
        }
        Ok(Phase::Update)
    }

    fn update(&mut self) -> Phase {
        let mut means = self.means();
        if means.iter().any(Option::is_none) {
            let mut provisional: Vec<Vec<f32>> = means
                .into_iter()
                .zip(&self.centroids)
                .map(|(m, old)| m.unwrap_or_else(|| old.clone()))
                .collect();
            self.reseeds += reseed_empty_clusters(
                self.collection,
                &mut self.labels,
                &mut provisional,
                self.config.reseed,
                &mut self.sampler,
            );
            means = self
                .means()
                .into_iter()
                .zip(provisional)
                .map(|(m, p)| Some(m.unwrap_or(p)))
                .collect();
        }

        let new_centroids: Vec<Vec<f32>> = means
            .into_iter()
            .zip(&self.centroids)
            .map(|(m, old)| m.unwrap_or_else(|| old.clone()))
            .collect();
        let displacement = self
            .centroids
            .iter()
            .zip(&new_centroids)
            .map(|(a, b)| l2(a, b))
            .fold(0.0f32, f32::max);
        self.centroids = new_centroids;

        let objective = self.objective();
        self.objective_history.push(objective);
        debug!(iteration = self.iterations, displacement, objective, "update");

        if displacement < self.config.epsilon {
            Phase::Converged
        } else if self.iterations >= self.config.max_iterations {
            Phase::Exhausted
        } else {
            Phase::Assign
        }
    }

    /// Mean of every cluster's members; `None` for empty clusters.
    fn means(&self) -> Vec<Option<Vec<f32>>> {
        let mut groups: Vec<Vec<&[f32]>> = vec![Vec::new(); self.centroids.len()];
        for (record, &label) in self.collection.iter().zip(&self.labels) {
            groups[label].push(record.coordinates());
        }
        let dim = self.collection.dimensionality();
        groups
            .into_iter()
            .map(|g| componentwise_mean(g, dim))
            .collect()
    }

    fn objective(&self) -> f64 {
        self.collection
            .iter()
            .zip(&self.labels)
            .map(|(r, &label)| squared_l2(r.coordinates(), &self.centroids[label]) as f64)
            .sum()
    }
}
