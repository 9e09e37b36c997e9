//! Utility modules for the matching pipeline.

pub mod progress;
