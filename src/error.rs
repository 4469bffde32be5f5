//! Error types for hashclust.
//!
//! Errors carry a status code plus a human readable message. Recoverable
//! conditions (empty range queries, empty clusters) never surface here; they
//! are handled by the fallback and reseed policies of the caller.

use std::fmt;
use thiserror::Error;

/// Error codes for the failure classes of the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A parameter (K, L, k, probe budgets, ...) is out of its valid range.
    Configuration,
    /// Records or centroids of differing dimension were combined.
    DimensionMismatch,
    /// Two collections lack a full identifier bijection.
    Correspondence,
    /// A record identifier is not present in the collection.
    UnknownIdentifier,
    /// A partition places one record in more than one cluster.
    DuplicateAssignment,
    /// An input file is malformed.
    Parse,
    /// Underlying I/O failure.
    Io,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Configuration => write!(f, "CONFIGURATION"),
            ErrorCode::DimensionMismatch => write!(f, "DIMENSION_MISMATCH"),
            ErrorCode::Correspondence => write!(f, "CORRESPONDENCE"),
            ErrorCode::UnknownIdentifier => write!(f, "UNKNOWN_IDENTIFIER"),
            ErrorCode::DuplicateAssignment => write!(f, "DUPLICATE_ASSIGNMENT"),
            ErrorCode::Parse => write!(f, "PARSE"),
            ErrorCode::Io => write!(f, "IO"),
        }
    }
}

/// Main error type for hashclust operations.
#[derive(Error, Debug, Clone)]
#[error("{code}: {message}")]
pub struct HashClustError {
    code: ErrorCode,
    message: String,
}

impl HashClustError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    // Convenience constructors

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, msg)
    }

    /// Create a dimension mismatch error from the two offending sizes.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(
            ErrorCode::DimensionMismatch,
            format!("expected dimension {expected}, got {actual}"),
        )
    }

    /// Create a correspondence error.
    pub fn correspondence(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Correspondence, msg)
    }

    /// Create an unknown identifier error.
    pub fn unknown_identifier(id: u32) -> Self {
        Self::new(
            ErrorCode::UnknownIdentifier,
            format!("record {id} is not present in the collection"),
        )
    }

    /// Create a duplicate assignment error.
    pub fn duplicate_assignment(id: u32) -> Self {
        Self::new(
            ErrorCode::DuplicateAssignment,
            format!("record {id} belongs to more than one cluster"),
        )
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Parse, msg)
    }
}

impl From<std::io::Error> for HashClustError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, err.to_string())
    }
}

/// Result type alias for hashclust operations.
pub type Result<T> = std::result::Result<T, HashClustError>;
