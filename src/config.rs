//! Configuration types for hashclust.
//!
//! Every index and the clustering engine is driven by one of the structures
//! below. They serialize with serde, carry sensible defaults and expose
//! builder-style setters.

use crate::distance_measures::WindowGrid;
use crate::error::{HashClustError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest hypercube dimension supported (vertex codes are stored in a u32).
pub const MAX_HYPERCUBE_DIMENSIONS: usize = 32;

/// Configuration of an amplified-hash (LSH) index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LshConfig {
    /// Number of hash tables (L).
    pub num_tables: usize,

    /// Number of hash functions combined per table (k).
    pub hashes_per_table: usize,

    /// Bucket width of every hash function. `None` estimates it from the data.
    pub bucket_width: Option<f32>,

    /// Seed for the hash function family.
    pub seed: u64,
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            num_tables: 5,
            hashes_per_table: 4,
            bucket_width: None,
            seed: 1,
        }
    }
}

impl LshConfig {
    /// Create a configuration with `k` hash functions per table and `l` tables.
    pub fn new(hashes_per_table: usize, num_tables: usize) -> Self {
        Self {
            num_tables,
            hashes_per_table,
            ..Default::default()
        }
    }

    /// Set a fixed bucket width.
    pub fn with_bucket_width(mut self, width: f32) -> Self {
        self.bucket_width = Some(width);
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<()> {
        if self.num_tables == 0 {
            return Err(HashClustError::configuration("number of hash tables (L) must be > 0"));
        }
        if self.hashes_per_table == 0 {
            return Err(HashClustError::configuration(
                "number of hash functions per table (k) must be > 0",
            ));
        }
        validate_bucket_width(self.bucket_width)
    }
}

/// Configuration of a hypercube projection index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypercubeConfig {
    /// Number of binary hash functions, i.e. bits per vertex code.
    pub dimensions: usize,

    /// Maximum number of candidates examined per query (M).
    pub max_points: usize,

    /// Maximum number of vertices probed per query.
    pub max_probes: usize,

    /// Bucket width used to draw the offsets of the hash functions.
    /// `None` estimates it from the data.
    pub bucket_width: Option<f32>,

    /// Seed for the hash function family.
    pub seed: u64,
}

impl Default for HypercubeConfig {
    fn default() -> Self {
        Self {
            dimensions: 3,
            max_points: 10,
            max_probes: 2,
            bucket_width: None,
            seed: 2,
        }
    }
}

impl HypercubeConfig {
    /// Create a configuration with the given number of vertex bits.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Default::default()
        }
    }

    /// Set the candidate budget.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Set the probe budget.
    pub fn with_max_probes(mut self, max_probes: usize) -> Self {
        self.max_probes = max_probes;
        self
    }

    /// Set a fixed bucket width.
    pub fn with_bucket_width(mut self, width: f32) -> Self {
        self.bucket_width = Some(width);
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 || self.dimensions > MAX_HYPERCUBE_DIMENSIONS {
            return Err(HashClustError::configuration(format!(
                "hypercube dimensions must be in 1..={MAX_HYPERCUBE_DIMENSIONS}, got {}",
                self.dimensions
            )));
        }
        if self.max_points == 0 {
            return Err(HashClustError::configuration("hypercube max_points (M) must be > 0"));
        }
        if self.max_probes == 0 {
            return Err(HashClustError::configuration("hypercube max_probes must be > 0"));
        }
        validate_bucket_width(self.bucket_width)
    }
}

fn validate_bucket_width(width: Option<f32>) -> Result<()> {
    match width {
        Some(w) if !(w.is_finite() && w > 0.0) => Err(HashClustError::configuration(format!(
            "bucket width must be a positive finite number, got {w}"
        ))),
        _ => Ok(()),
    }
}

/// Radius policy of the reverse (index-backed) assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSearchConfig {
    /// Starting radius. `None` uses half the smallest inter-centroid distance.
    pub initial_radius: Option<f32>,

    /// Number of times the radius may be doubled in one assignment pass.
    pub max_doublings: usize,
}

impl Default for RangeSearchConfig {
    fn default() -> Self {
        Self {
            initial_radius: None,
            max_doublings: 6,
        }
    }
}

/// How records are assigned to centroids in each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMethod {
    /// Exact nearest centroid for every record.
    #[default]
    Lloyd,
    /// Reverse assignment through range queries on an amplified-hash index.
    Lsh,
    /// Reverse assignment through range queries on a hypercube index.
    Hypercube,
}

/// How the initial centroids are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitPolicy {
    /// Uniformly random distinct records.
    Random,
    /// k-means++ weighted sampling by squared distance.
    #[default]
    KMeansPlusPlus,
}

/// How a cluster left empty after assignment gets a new centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReseedPolicy {
    /// Take the record farthest from its own centroid.
    #[default]
    FarthestRecord,
    /// Take a random record from a cluster with more than one member.
    RandomRecord,
}

/// Configuration of the clustering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Number of clusters (K).
    pub num_clusters: usize,

    /// Iteration cap. Reaching it reports the run as non-converged.
    pub max_iterations: usize,

    /// Convergence threshold on the largest centroid displacement.
    pub epsilon: f32,

    /// Assignment strategy.
    pub assignment: AssignmentMethod,

    /// Initial centroid policy.
    pub init: InitPolicy,

    /// Empty cluster policy.
    pub reseed: ReseedPolicy,

    /// Seed shared by the init and reseed policies.
    pub seed: u64,

    /// Index parameters for `AssignmentMethod::Lsh`.
    pub lsh: LshConfig,

    /// Index parameters for `AssignmentMethod::Hypercube`.
    pub hypercube: HypercubeConfig,

    /// Radius policy for the reverse assignment strategies.
    pub range_search: RangeSearchConfig,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            num_clusters: 10,
            max_iterations: 50,
            epsilon: 1e-3,
            assignment: AssignmentMethod::Lloyd,
            init: InitPolicy::KMeansPlusPlus,
            reseed: ReseedPolicy::FarthestRecord,
            seed: 42,
            lsh: LshConfig::default(),
            hypercube: HypercubeConfig::default(),
            range_search: RangeSearchConfig::default(),
        }
    }
}

impl ClusteringConfig {
    /// Create a configuration with the given number of clusters.
    pub fn new(num_clusters: usize) -> Self {
        Self {
            num_clusters,
            ..Default::default()
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence threshold.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the assignment strategy.
    pub fn with_assignment(mut self, assignment: AssignmentMethod) -> Self {
        self.assignment = assignment;
        self
    }

    /// Set the initial centroid policy.
    pub fn with_init(mut self, init: InitPolicy) -> Self {
        self.init = init;
        self
    }

    /// Set the empty cluster policy.
    pub fn with_reseed(mut self, reseed: ReseedPolicy) -> Self {
        self.reseed = reseed;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the amplified-hash index parameters.
    pub fn with_lsh(mut self, lsh: LshConfig) -> Self {
        self.lsh = lsh;
        self
    }

    /// Set the hypercube index parameters.
    pub fn with_hypercube(mut self, hypercube: HypercubeConfig) -> Self {
        self.hypercube = hypercube;
        self
    }

    /// Set the reverse assignment radius policy.
    pub fn with_range_search(mut self, range_search: RangeSearchConfig) -> Self {
        self.range_search = range_search;
        self
    }

    /// Check that all parameters are in range for a collection of `num_records`.
    pub fn validate(&self, num_records: usize) -> Result<()> {
        if self.num_clusters == 0 {
            return Err(HashClustError::configuration("number of clusters (K) must be > 0"));
        }
        if self.num_clusters > num_records {
            return Err(HashClustError::configuration(format!(
                "number of clusters ({}) exceeds collection size ({num_records})",
                self.num_clusters
            )));
        }
        if self.max_iterations == 0 {
            return Err(HashClustError::configuration("max_iterations must be > 0"));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(HashClustError::configuration("epsilon must be finite and >= 0"));
        }
        if let Some(r) = self.range_search.initial_radius {
            if !(r.is_finite() && r > 0.0) {
                return Err(HashClustError::configuration("initial radius must be > 0"));
            }
        }
        match self.assignment {
            AssignmentMethod::Lloyd => Ok(()),
            AssignmentMethod::Lsh => self.lsh.validate(),
            AssignmentMethod::Hypercube => self.hypercube.validate(),
        }
    }
}

/// Configuration of the cross-space search comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Query-time amplified-hash index parameters.
    pub lsh: LshConfig,

    /// Candidate budget of the approximate nearest neighbor scan.
    /// `None` uses `10 * L`.
    pub max_candidates: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lsh: LshConfig::default(),
            max_candidates: None,
        }
    }
}

impl SearchConfig {
    /// Create a search configuration with `k` hash functions and `l` tables.
    pub fn new(hashes_per_table: usize, num_tables: usize) -> Self {
        Self {
            lsh: LshConfig::new(hashes_per_table, num_tables),
            max_candidates: None,
        }
    }

    /// Set the candidate budget.
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = Some(max_candidates);
        self
    }

    /// Effective candidate budget.
    pub fn candidate_budget(&self) -> usize {
        self.max_candidates.unwrap_or(10 * self.lsh.num_tables)
    }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == Some(0) {
            return Err(HashClustError::configuration("max_candidates must be > 0"));
        }
        self.lsh.validate()
    }
}

/// Configuration of the earth mover's versus Manhattan neighbor comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmdSearchConfig {
    /// Neighbors retrieved per query and metric.
    pub neighbors: usize,

    /// Image width in pixels.
    pub image_width: usize,

    /// Image height in pixels.
    pub image_height: usize,

    /// Window width in pixels.
    pub window_width: usize,

    /// Window height in pixels.
    pub window_height: usize,
}

impl Default for EmdSearchConfig {
    fn default() -> Self {
        Self {
            neighbors: 10,
            image_width: 28,
            image_height: 28,
            window_width: 7,
            window_height: 7,
        }
    }
}

impl EmdSearchConfig {
    /// Create a configuration with the default 28x28 images and 7x7 windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of neighbors per query.
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Set the image size.
    pub fn with_image_size(mut self, width: usize, height: usize) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set the window size.
    pub fn with_window_size(mut self, width: usize, height: usize) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// The window grid these sizes describe.
    pub fn grid(&self) -> Result<WindowGrid> {
        WindowGrid::new(self.image_width, self.image_height, self.window_width, self.window_height)
    }

    /// Check that all parameters are in range.
    pub fn validate(&self) -> Result<()> {
        if self.neighbors == 0 {
            return Err(HashClustError::configuration("number of neighbors must be > 0"));
        }
        self.grid().map(|_| ())
    }
}

/// On-disk configuration of the clustering driver.
///
/// Key names follow the classic cluster configuration file; every key is
/// optional and falls back to the library default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterFileConfig {
    /// Number of clusters (K).
    pub number_of_clusters: Option<usize>,

    /// Number of LSH tables (L).
    pub number_of_vector_hash_tables: Option<usize>,

    /// Number of LSH hash functions per table (k).
    pub number_of_vector_hash_functions: Option<usize>,

    /// Hypercube candidate budget (M).
    #[serde(rename = "max_number_M_hypercube")]
    pub max_number_m_hypercube: Option<usize>,

    /// Hypercube vertex bits.
    pub number_of_hypercube_dimensions: Option<usize>,

    /// Hypercube probe budget.
    pub number_of_probes: Option<usize>,
}

impl ClusterFileConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| HashClustError::parse(format!("invalid config: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Merge the file values over the defaults.
    pub fn into_clustering_config(self) -> ClusteringConfig {
        let mut config = ClusteringConfig::default();
        if let Some(k) = self.number_of_clusters {
            config.num_clusters = k;
        }
        if let Some(l) = self.number_of_vector_hash_tables {
            config.lsh.num_tables = l;
        }
        if let Some(k) = self.number_of_vector_hash_functions {
            config.lsh.hashes_per_table = k;
        }
        if let Some(m) = self.max_number_m_hypercube {
            config.hypercube.max_points = m;
        }
        if let Some(d) = self.number_of_hypercube_dimensions {
            config.hypercube.dimensions = d;
        }
        if let Some(p) = self.number_of_probes {
            config.hypercube.max_probes = p;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emd_search_config() {
        let config = EmdSearchConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid().unwrap().num_windows(), 16);

        assert!(config.clone().with_neighbors(0).validate().is_err());
        assert!(config.clone().with_window_size(5, 7).validate().is_err());
        assert!(config.with_image_size(20, 14).with_window_size(5, 7).validate().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = ClusteringConfig::default();
        assert_eq!(config.num_clusters, 10);
        assert_eq!(config.assignment, AssignmentMethod::Lloyd);
        assert_eq!(config.lsh.num_tables, 5);
        assert_eq!(config.lsh.hashes_per_table, 4);
        assert_eq!(config.hypercube.dimensions, 3);
    }

    #[test]
    fn test_validate_cluster_count() {
        assert!(ClusteringConfig::new(0).validate(10).is_err());
        assert!(ClusteringConfig::new(11).validate(10).is_err());
        assert!(ClusteringConfig::new(10).validate(10).is_ok());
    }

    #[test]
    fn test_validate_index_parameters() {
        let config = ClusteringConfig::new(2)
            .with_assignment(AssignmentMethod::Lsh)
            .with_lsh(LshConfig::new(0, 5));
        assert!(config.validate(10).is_err());

        let config = ClusteringConfig::new(2)
            .with_assignment(AssignmentMethod::Hypercube)
            .with_hypercube(HypercubeConfig::new(33));
        assert!(config.validate(10).is_err());

        let config = ClusteringConfig::new(2)
            .with_assignment(AssignmentMethod::Hypercube)
            .with_hypercube(HypercubeConfig::new(8).with_max_probes(0));
        assert!(config.validate(10).is_err());

        // Index parameters are irrelevant for Lloyd's assignment
        let config = ClusteringConfig::new(2).with_lsh(LshConfig::new(0, 0));
        assert!(config.validate(10).is_ok());
    }

    #[test]
    fn test_bucket_width_validation() {
        assert!(LshConfig::new(4, 5).with_bucket_width(-1.0).validate().is_err());
        assert!(LshConfig::new(4, 5).with_bucket_width(f32::NAN).validate().is_err());
        assert!(LshConfig::new(4, 5).with_bucket_width(2.5).validate().is_ok());
    }

    #[test]
    fn test_search_candidate_budget() {
        let config = SearchConfig::new(4, 6);
        assert_eq!(config.candidate_budget(), 60);
        assert_eq!(config.with_max_candidates(7).candidate_budget(), 7);
    }

    #[test]
    fn test_config_serialization() {
        let config = ClusteringConfig::new(20)
            .with_assignment(AssignmentMethod::Hypercube)
            .with_init(InitPolicy::Random);

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ClusteringConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, config);
        assert!(json.contains("\"hypercube\""));
    }

    #[test]
    fn test_cluster_file_config() {
        let text = r#"
number_of_clusters = 7
number_of_vector_hash_tables = 3
max_number_M_hypercube = 50
number_of_probes = 4
"#;
        let config = ClusterFileConfig::from_toml_str(text)
            .unwrap()
            .into_clustering_config();

        assert_eq!(config.num_clusters, 7);
        assert_eq!(config.lsh.num_tables, 3);
        assert_eq!(config.lsh.hashes_per_table, 4);
        assert_eq!(config.hypercube.max_points, 50);
        assert_eq!(config.hypercube.max_probes, 4);
        assert_eq!(config.hypercube.dimensions, 3);
    }

    #[test]
    fn test_cluster_file_config_rejects_garbage() {
        assert!(ClusterFileConfig::from_toml_str("number_of_clusters = \"many\"").is_err());
    }
}
