//! Configuration for the matching pipeline.
//!
//! This module provides the structures used to configure a matching run:
//! which columns participate, how missing covariate cells are filled, and
//! which assignment policy resolves the without-replacement constraint.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{MatchError, Result};

/// Policy for resolving the without-replacement assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// Process treated records in a fixed order; each picks its nearest
    /// still-available control. O(T * C) worst case.
    #[default]
    GreedySequential,
    /// Minimize total assignment distance with a shortest augmenting path
    /// solver. O(C^3) for balanced pools.
    GlobalOptimal,
}

/// Policy for filling missing covariate cells
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Replace missing cells with 0.0
    #[default]
    ZeroFill,
    /// Replace missing cells with a fixed value
    FillWith(f64),
}

impl MissingValuePolicy {
    /// The value substituted for a missing cell under this policy
    #[must_use]
    pub const fn fill_value(self) -> f64 {
        match self {
            Self::ZeroFill => 0.0,
            Self::FillWith(v) => v,
        }
    }
}

/// Configuration for the matching process
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Name of the unique identifier column
    pub id_column: String,

    /// Name of the binary treatment indicator column (used when splitting a
    /// combined dataset into treated and control groups)
    pub treatment_column: String,

    /// Covariate columns used to measure similarity. Columns not listed here
    /// are carried through to the output untouched.
    pub covariates: Vec<String>,

    /// Per-column distance weights, keyed by covariate column name. One-hot
    /// features derived from a categorical column inherit its weight.
    /// Unlisted columns weigh 1.0.
    pub weights: HashMap<String, f64>,

    /// How missing covariate cells are filled
    pub missing_value_policy: MissingValuePolicy,

    /// The assignment policy
    pub policy: AssignmentPolicy,

    /// Whether to compute the distance matrix in parallel for large inputs
    pub use_parallel: bool,

    /// Optional seed shuffling the treated processing order for the greedy
    /// policy; `None` keeps the input order
    pub random_seed: Option<u64>,

    /// Iteration budget for the global-optimal solver; `None` leaves the
    /// solver bounded only by its natural termination
    pub solver_iteration_limit: Option<u64>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            treatment_column: "treatment".to_string(),
            covariates: Vec::new(),
            weights: HashMap::new(),
            missing_value_policy: MissingValuePolicy::default(),
            policy: AssignmentPolicy::default(),
            use_parallel: true,
            random_seed: None,
            solver_iteration_limit: None,
        }
    }
}

impl MatchingConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new builder for constructing a matching configuration
    #[must_use]
    pub fn builder() -> MatchingConfigBuilder {
        MatchingConfigBuilder::new()
    }

    /// Validate the configuration before a run
    pub fn validate(&self) -> Result<()> {
        if self.id_column.is_empty() {
            return Err(MatchError::InvalidConfig(
                "id_column must not be empty".to_string(),
            ));
        }

        for (column, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(MatchError::InvalidConfig(format!(
                    "weight for column {column} must be finite and non-negative, got {weight}"
                )));
            }
            if !self.covariates.iter().any(|c| c == column) {
                log::warn!("Weight declared for {column}, which is not a covariate column");
            }
        }

        if let MissingValuePolicy::FillWith(v) = self.missing_value_policy {
            if !v.is_finite() {
                return Err(MatchError::InvalidConfig(format!(
                    "missing-value fill constant must be finite, got {v}"
                )));
            }
        }

        Ok(())
    }

    /// Distance weight for a covariate column
    #[must_use]
    pub fn weight_for(&self, column: &str) -> f64 {
        self.weights.get(column).copied().unwrap_or(1.0)
    }
}

/// Builder for constructing a matching configuration
#[derive(Debug, Clone, Default)]
pub struct MatchingConfigBuilder {
    config: MatchingConfig,
}

impl MatchingConfigBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: MatchingConfig::default(),
        }
    }

    /// Set the identifier column name
    #[must_use]
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.config.id_column = column.into();
        self
    }

    /// Set the treatment indicator column name
    #[must_use]
    pub fn treatment_column(mut self, column: impl Into<String>) -> Self {
        self.config.treatment_column = column.into();
        self
    }

    /// Set the covariate columns
    #[must_use]
    pub fn covariates<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.covariates = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the distance weight for a covariate column
    #[must_use]
    pub fn weight(mut self, column: impl Into<String>, weight: f64) -> Self {
        self.config.weights.insert(column.into(), weight);
        self
    }

    /// Set the missing-value policy
    #[must_use]
    pub const fn missing_value_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.config.missing_value_policy = policy;
        self
    }

    /// Set the assignment policy
    #[must_use]
    pub const fn policy(mut self, policy: AssignmentPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Set whether to compute distances in parallel
    #[must_use]
    pub const fn use_parallel(mut self, parallel: bool) -> Self {
        self.config.use_parallel = parallel;
        self
    }

    /// Set the random seed for the greedy processing order
    #[must_use]
    pub const fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Set the iteration budget for the global-optimal solver
    #[must_use]
    pub const fn solver_iteration_limit(mut self, limit: u64) -> Self {
        self.config.solver_iteration_limit = Some(limit);
        self
    }

    /// Build the matching configuration
    #[must_use]
    pub fn build(self) -> MatchingConfig {
        self.config
    }
}
