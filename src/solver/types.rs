//! Type definitions for the assignment solvers.

use arrow::record_batch::RecordBatch;
use std::time::Duration;

/// One treated record paired with its matched control
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    /// Treated record identifier
    pub treated_id: String,
    /// Treated batch row
    pub treated_row: usize,
    /// Matched control identifier
    pub control_id: String,
    /// Control batch row
    pub control_row: usize,
    /// Realized covariate distance
    pub distance: f64,
}

/// A treated record left without a control after pool exhaustion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedTreated {
    /// Treated record identifier
    pub treated_id: String,
    /// Treated batch row
    pub treated_row: usize,
}

/// Raw solver output, before assembly into an output batch
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    /// Matched pairs
    pub pairs: Vec<MatchedPair>,
    /// Treated records reported unmatched
    pub unmatched: Vec<UnmatchedTreated>,
}

impl Assignment {
    /// Total realized distance across all pairs
    #[must_use]
    pub fn total_distance(&self) -> f64 {
        self.pairs.iter().map(|p| p.distance).sum()
    }
}

/// Result of one full matching run
#[derive(Debug, Clone)]
pub struct MatchingResult {
    /// Wide output batch: one row per treated record, `_matched` columns for
    /// the control side, nulls where no control was assigned
    pub output: RecordBatch,
    /// Matched pairs
    pub pairs: Vec<MatchedPair>,
    /// Treated records reported unmatched
    pub unmatched: Vec<UnmatchedTreated>,
    /// Missing covariate cells resolved by the fill policy
    pub filled_cells: usize,
    /// Time taken for the run
    pub matching_time: Duration,
}

impl MatchingResult {
    /// Number of matched treated records
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.pairs.len()
    }

    /// Number of unmatched treated records
    #[must_use]
    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }

    /// Total realized distance across all pairs
    #[must_use]
    pub fn total_distance(&self) -> f64 {
        self.pairs.iter().map(|p| p.distance).sum()
    }
}
