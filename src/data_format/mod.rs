//! Data format types for hashclust.
//!
//! This module provides the record and collection types every index,
//! clustering run and evaluation works against.

mod collection;
mod record;

pub use collection::RecordCollection;
pub use record::{RecordIdCounter, VectorRecord};
