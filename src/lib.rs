//! A Rust library for 1:1 nearest-neighbor case-control matching without
//! replacement over Arrow record batches.
//!
//! The pipeline runs in four stages, each consuming the previous stage's
//! output in full: covariate encoding, distance computation, without-
//! replacement assignment, and wide-output assembly.

pub mod assemble;
pub mod config;
pub mod distance;
pub mod encode;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod solver;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{AssignmentPolicy, MatchingConfig, MissingValuePolicy};
pub use error::{MatchError, Result};
pub use matcher::{Matcher, split_by_treatment};
pub use solver::{ControlPool, MatchedPair, MatchingResult, UnmatchedTreated};

// Arrow types
pub use arrow::datatypes::Schema as ArrowSchema;
pub use arrow::record_batch::RecordBatch;

// Pipeline stages
pub use assemble::{DISTANCE_COLUMN, MATCHED_SUFFIX, assemble_output};
pub use distance::{distance_matrix, weighted_euclidean};
pub use encode::{CovariateSchema, encode_batch};
