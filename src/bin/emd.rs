//! Earth mover's versus Manhattan search driver.
//!
//! Retrieves the nearest training images of every query under both metrics
//! and reports how often the neighbors share the query's label.

use clap::Parser;
use hashclust::config::EmdSearchConfig;
use hashclust::data_format::{RecordCollection, RecordIdCounter};
use hashclust::io::{load_idx_with_header, load_labels, write_comparison_report};
use hashclust::search::MetricComparison;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "emd")]
#[command(about = "Compare earth mover's and Manhattan nearest neighbors by label agreement")]
struct Args {
    /// Input images (IDX)
    #[arg(short = 'd')]
    input: PathBuf,

    /// Query images (IDX) of the same shape
    #[arg(short = 'q')]
    queries: PathBuf,

    /// Input labels (IDX)
    #[arg(long = "l1")]
    input_labels: PathBuf,

    /// Query labels (IDX)
    #[arg(long = "l2")]
    query_labels: PathBuf,

    /// Output file
    #[arg(short = 'o')]
    output: PathBuf,

    /// Window width in pixels
    #[arg(long, default_value_t = 7)]
    width: usize,

    /// Window height in pixels
    #[arg(long, default_value_t = 7)]
    height: usize,

    /// Neighbors retrieved per query
    #[arg(short = 'k', default_value_t = 10)]
    neighbors: usize,

    /// Only answer the first queries
    #[arg(long)]
    max_queries: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    hashclust::logging::init();
    let args = Args::parse();

    let mut counter = RecordIdCounter::new();
    let (header, input) = load_idx_with_header(&args.input, &mut counter)?;
    counter.reset();
    let (_, mut queries) = load_idx_with_header(&args.queries, &mut counter)?;
    let input_labels = load_labels(&args.input_labels)?;
    let mut query_labels = load_labels(&args.query_labels)?;

    if let Some(max) = args.max_queries.filter(|&max| max < queries.len()) {
        queries = RecordCollection::from_records(queries.records()[..max].to_vec())?;
        query_labels.truncate(max);
    }

    let config = EmdSearchConfig::new()
        .with_neighbors(args.neighbors)
        .with_image_size(header.cols as usize, header.rows as usize)
        .with_window_size(args.width, args.height);
    let comparison = MetricComparison::new(&input, &input_labels, config)?;
    let report = comparison.run(&queries, &query_labels)?;

    let mut out = BufWriter::new(File::create(&args.output)?);
    write_comparison_report(&mut out, &report)?;
    out.flush()?;
    Ok(())
}
