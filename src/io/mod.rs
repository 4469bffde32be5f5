//! File formats read and written by the command-line drivers.

mod idx;
mod partition_file;
mod report;

pub use idx::{
    load_idx, load_idx_with_header, load_labels, read_header, read_idx, read_idx_with_header, read_labels, write_idx,
    write_labels, IdxHeader, IDX_LABEL_MAGIC, IDX_MAGIC,
};
pub use partition_file::{load_partition, parse_partition, write_partition};
pub use report::{write_comparison_report, write_evaluation_section, write_search_report};
