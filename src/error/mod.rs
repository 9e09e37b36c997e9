//! Error handling for the matching pipeline.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::io;

/// Specialized error type for matching operations
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// A record batch lacks a declared column, or a declared column has an
    /// unusable data type
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The control pool was empty before matching started
    #[error("Empty control pool: no control records available for matching")]
    EmptyControlPool,

    /// The matching configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The global-optimal assignment solver ran past its iteration budget
    #[error("Assignment solver exceeded its iteration limit of {0}")]
    SolverLimitExceeded(u64),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for matching operations
pub type Result<T> = std::result::Result<T, MatchError>;
