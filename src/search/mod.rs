//! Nearest neighbor comparisons.
//!
//! - [`CrossSpaceSearcher`] compares approximate, reduced-space and exact
//!   nearest neighbors, all measured in the original space.
//! - [`MetricComparison`] retrieves neighbors under the earth mover's and the
//!   Manhattan distance and scores both by label agreement with the query.

mod cross_space;
mod metric_comparison;

pub use cross_space::{CrossSpaceSearcher, QueryReport, SearchReport};
pub use metric_comparison::{ComparisonReport, MetricComparison, QueryComparison};
