//! Partition files.
//!
//! One line per cluster:
//!
//! ```text
//! CLUSTER-1 { size: 3, 0, 17, 42}
//! ```
//!
//! The `size` value must match the number of identifiers on the line.

use crate::data_format::RecordCollection;
use crate::error::{HashClustError, Result};
use crate::evaluation::Partition;
use crate::types::RecordId;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

fn parse_line(line_no: usize, line: &str) -> Result<Vec<RecordId>> {
    let malformed = |what: &str| HashClustError::parse(format!("line {line_no}: {what}"));

    let rest = line.strip_prefix("CLUSTER-").ok_or_else(|| malformed("expected `CLUSTER-`"))?;
    let (label, body) = rest.split_once('{').ok_or_else(|| malformed("expected `{`"))?;
    label
        .trim()
        .parse::<usize>()
        .map_err(|_| malformed("invalid cluster number"))?;
    let body = body.trim_end().strip_suffix('}').ok_or_else(|| malformed("expected `}`"))?;

    let mut fields = body.split(',').map(str::trim);
    let size = fields
        .next()
        .and_then(|f| f.strip_prefix("size:"))
        .ok_or_else(|| malformed("expected `size:`"))?
        .trim()
        .parse::<usize>()
        .map_err(|_| malformed("invalid size"))?;

    let ids = fields
        .filter(|f| !f.is_empty())
        .map(|f| f.parse::<RecordId>().map_err(|_| malformed(&format!("invalid identifier `{f}`"))))
        .collect::<Result<Vec<_>>>()?;
    if ids.len() != size {
        return Err(malformed(&format!("size {size} but {} identifiers", ids.len())));
    }
    Ok(ids)
}

/// Parse a partition file's contents.
pub fn parse_partition(text: &str) -> Result<Partition> {
    let clusters = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(i + 1, line.trim()))
        .collect::<Result<Vec<_>>>()?;
    Partition::new(clusters)
}

/// Read a partition file and check every identifier against `collection`.
pub fn load_partition(path: impl AsRef<Path>, collection: &RecordCollection) -> Result<Partition> {
    let text = std::fs::read_to_string(path)?;
    let partition = parse_partition(&text)?;
    partition.validate_against(collection)?;
    Ok(partition)
}

/// Write member sets in partition file format, numbering clusters from 1.
pub fn write_partition<W: Write>(mut writer: W, clusters: &[BTreeSet<RecordId>]) -> Result<()> {
    for (i, members) in clusters.iter().enumerate() {
        write!(writer, "CLUSTER-{} {{ size: {}", i + 1, members.len())?;
        for id in members {
            write!(writer, ", {id}")?;
        }
        writeln!(writer, "}}")?;
    }
    Ok(())
}
