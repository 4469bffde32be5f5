//! Plain-text reports of the clustering and search drivers.

use crate::error::Result;
use crate::evaluation::Evaluation;
use crate::search::{ComparisonReport, SearchReport};
use crate::types::Neighbor;
use std::io::Write;

/// Write one titled evaluation section:
///
/// ```text
/// NEW SPACE
/// Silhouette: [0.61, 0.48, 0.55]
/// Value of Objective Function: 1234.5
/// ```
///
/// The silhouette list holds the per-cluster means followed by the overall mean.
pub fn write_evaluation_section<W: Write>(mut writer: W, title: &str, evaluation: &Evaluation) -> Result<()> {
    writeln!(writer, "{title}")?;
    let values: Vec<String> = evaluation
        .silhouette
        .as_sequence()
        .iter()
        .map(|s| s.to_string())
        .collect();
    writeln!(writer, "Silhouette: [{}]", values.join(", "))?;
    writeln!(writer, "Value of Objective Function: {}", evaluation.objective)?;
    Ok(())
}

fn neighbor_fields(n: Option<Neighbor>) -> (String, String) {
    match n {
        Some(n) => (n.id.to_string(), n.distance.to_string()),
        None => ("-".to_string(), "-".to_string()),
    }
}

fn factor(f: Option<f64>) -> String {
    f.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Write a search report: one block per query, then the mean approximation
/// factors. Missing answers print as `-`.
pub fn write_search_report<W: Write>(mut writer: W, report: &SearchReport) -> Result<()> {
    for q in &report.queries {
        let (reduced_id, reduced_dist) = neighbor_fields(q.reduced);
        let (lsh_id, lsh_dist) = neighbor_fields(q.lsh);
        let (true_id, true_dist) = neighbor_fields(q.exact);

        writeln!(writer, "Query: {}", q.query)?;
        writeln!(writer, "Nearest neighbor Reduced: {reduced_id}")?;
        writeln!(writer, "Nearest neighbor LSH: {lsh_id}")?;
        writeln!(writer, "Nearest neighbor True: {true_id}")?;
        writeln!(writer, "distanceReduced: {reduced_dist}")?;
        writeln!(writer, "distanceLSH: {lsh_dist}")?;
        writeln!(writer, "distanceTrue: {true_dist}")?;
        writeln!(writer, "tReduced: {:.6}", q.reduced_time.as_secs_f64())?;
        writeln!(writer, "tLSH: {:.6}", q.lsh_time.as_secs_f64())?;
        writeln!(writer, "tTrue: {:.6}", q.exact_time.as_secs_f64())?;
        writeln!(writer)?;
    }
    writeln!(writer, "Approximation Factor LSH: {}", factor(report.mean_lsh_factor))?;
    writeln!(writer, "Approximation Factor Reduced: {}", factor(report.mean_reduced_factor))?;
    Ok(())
}

/// Write the mean label agreement of both metrics:
///
/// ```text
/// Average Correct Search Results EMD: 0.8
/// Average Correct Search Results Manhattan: 0.7
/// ```
pub fn write_comparison_report<W: Write>(mut writer: W, report: &ComparisonReport) -> Result<()> {
    writeln!(writer, "Average Correct Search Results EMD: {}", factor(report.mean_emd_correct))?;
    writeln!(
        writer,
        "Average Correct Search Results Manhattan: {}",
        factor(report.mean_manhattan_correct)
    )?;
    Ok(())
}
