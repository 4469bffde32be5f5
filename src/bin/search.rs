//! Search comparison driver.
//!
//! For every query, compares the amplified-hash answer and the reduced-space
//! answer with the exact nearest neighbor in the original space.

use clap::Parser;
use hashclust::config::SearchConfig;
use hashclust::data_format::RecordIdCounter;
use hashclust::io::{load_idx, write_search_report};
use hashclust::search::CrossSpaceSearcher;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "search")]
#[command(about = "Compare LSH and reduced-space nearest neighbors against exact search")]
struct Args {
    /// Original space input (IDX)
    #[arg(short = 'd')]
    original: PathBuf,

    /// New (reduced) space input (IDX) with the same records
    #[arg(short = 'i')]
    reduced: PathBuf,

    /// Original space queries (IDX)
    #[arg(short = 'q')]
    queries: PathBuf,

    /// New (reduced) space queries (IDX) with the same records
    #[arg(short = 's')]
    reduced_queries: PathBuf,

    /// Hash functions per table
    #[arg(short = 'k', default_value_t = 4)]
    hashes_per_table: usize,

    /// Number of hash tables
    #[arg(short = 'L', default_value_t = 5)]
    tables: usize,

    /// Output file
    #[arg(short = 'o')]
    output: PathBuf,

    /// Candidate budget of the index lookup (default 10 * L)
    #[arg(long)]
    max_candidates: Option<usize>,

    /// Random seed of the hash functions
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    hashclust::logging::init();
    let args = Args::parse();

    let mut config = SearchConfig::new(args.hashes_per_table, args.tables);
    if let Some(max_candidates) = args.max_candidates {
        config = config.with_max_candidates(max_candidates);
    }
    if let Some(seed) = args.seed {
        config.lsh.seed = seed;
    }

    let mut counter = RecordIdCounter::new();
    let original = load_idx(&args.original, &mut counter)?;
    counter.reset();
    let reduced = load_idx(&args.reduced, &mut counter)?;
    counter.reset();
    let queries = load_idx(&args.queries, &mut counter)?;
    counter.reset();
    let reduced_queries = load_idx(&args.reduced_queries, &mut counter)?;

    let searcher = CrossSpaceSearcher::new(&original, &reduced, config)?;
    let report = searcher.run(&queries, &reduced_queries)?;

    let mut out = BufWriter::new(File::create(&args.output)?);
    write_search_report(&mut out, &report)?;
    out.flush()?;
    Ok(())
}
