//! Clustering quality metrics.
//!
//! Silhouette and objective scores, optionally measured in a different
//! coordinate space than the one the clustering was computed in.

mod evaluator;
mod objective;
mod partition;
mod silhouette;

pub use evaluator::{Evaluation, Evaluator};
pub use objective::{centroidize, objective_function};
pub use partition::Partition;
pub use silhouette::{silhouette, SilhouetteReport};
