//! Clustering driver.
//!
//! Clusters the reduced ("new space") data and the original data with the
//! same parameters, scores both in the original space, and scores an
//! external partition of the original data for comparison.

use clap::{Parser, ValueEnum};
use hashclust::config::{AssignmentMethod, ClusterFileConfig, ClusteringConfig};
use hashclust::data_format::{RecordCollection, RecordIdCounter};
use hashclust::evaluation::{Evaluation, Evaluator};
use hashclust::io::{load_idx, load_partition, write_evaluation_section};
use hashclust::ClusteringEngine;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Lloyd,
    Lsh,
    Hypercube,
}

impl From<Method> for AssignmentMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Lloyd => AssignmentMethod::Lloyd,
            Method::Lsh => AssignmentMethod::Lsh,
            Method::Hypercube => AssignmentMethod::Hypercube,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "cluster")]
#[command(about = "k-means clustering in original and reduced space, scored in original space")]
struct Args {
    /// Original space input (IDX)
    #[arg(short = 'd')]
    original: PathBuf,

    /// New (reduced) space input (IDX) with the same records
    #[arg(short = 'i')]
    reduced: PathBuf,

    /// Partition file with the classes of the original input
    #[arg(short = 'n')]
    classes: PathBuf,

    /// Configuration file (TOML)
    #[arg(short = 'c')]
    config: PathBuf,

    /// Output file
    #[arg(short = 'o')]
    output: PathBuf,

    /// Assignment strategy
    #[arg(long, value_enum, default_value_t = Method::Lloyd)]
    method: Method,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn cluster_and_score(
    collection: &RecordCollection,
    original: &RecordCollection,
    config: &ClusteringConfig,
) -> Result<Evaluation, Box<dyn Error>> {
    let start = Instant::now();
    let result = ClusteringEngine::new(collection, config.clone())?.run()?;
    info!(
        dim = collection.dimensionality(),
        iterations = result.iterations,
        converged = result.converged,
        seconds = start.elapsed().as_secs_f64(),
        "clustered"
    );
    Ok(Evaluator::new(original).evaluate_cross_space(&result, collection)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    hashclust::logging::init();
    let args = Args::parse();

    let mut config = ClusterFileConfig::load(&args.config)?.into_clustering_config();
    config.assignment = args.method.into();
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut counter = RecordIdCounter::new();
    let original = load_idx(&args.original, &mut counter)?;
    counter.reset();
    let reduced = load_idx(&args.reduced, &mut counter)?;

    let mut out = BufWriter::new(File::create(&args.output)?);

    let evaluation = cluster_and_score(&reduced, &original, &config)?;
    write_evaluation_section(&mut out, "NEW SPACE", &evaluation)?;

    let evaluation = cluster_and_score(&original, &original, &config)?;
    write_evaluation_section(&mut out, "ORIGINAL SPACE", &evaluation)?;

    let classes = load_partition(&args.classes, &original)?;
    let evaluation = Evaluator::new(&original).evaluate_partition(&classes)?;
    write_evaluation_section(&mut out, "CLASSES AS CLUSTERS", &evaluation)?;

    out.flush()?;
    Ok(())
}
