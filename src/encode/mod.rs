//! Covariate encoding for the matching pipeline.
//!
//! This module maps raw record batches with mixed column types onto
//! fixed-length numeric vectors with a schema that is identical across the
//! treated and control groups. Numeric and boolean columns pass through as a
//! single feature; string columns are one-hot expanded.

pub mod encoder;
pub mod schema;

pub use encoder::{EncodedMatrix, encode_batch};
pub use schema::{CovariateSchema, FeatureKind, FeatureSpec};
