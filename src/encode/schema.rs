//! Covariate schema resolution.
//!
//! The schema is built once per run from the treated and control batches
//! together, so both groups encode to vectors of identical length and feature
//! order. Categorical levels are collected from both batches and sorted,
//! which keeps the expanded feature order deterministic across runs.

use arrow::array::{Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::config::MatchingConfig;
use crate::error::{MatchError, Result};

/// How a source column contributes to the covariate vector
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    /// Numeric or boolean column contributing one feature
    Numeric,
    /// String column expanded into one indicator feature per level
    Categorical(Vec<String>),
}

/// A declared covariate column resolved against the input schemas
#[derive(Debug, Clone)]
pub struct FeatureSpec {
    /// Source column name
    pub name: String,
    /// How the column is encoded
    pub kind: FeatureKind,
    /// Distance weight applied to every feature derived from this column
    pub weight: f64,
}

impl FeatureSpec {
    /// Number of vector slots this column occupies
    #[must_use]
    pub fn width(&self) -> usize {
        match &self.kind {
            FeatureKind::Numeric => 1,
            FeatureKind::Categorical(levels) => levels.len(),
        }
    }
}

/// Resolved covariate schema shared by the treated and control groups
#[derive(Debug, Clone)]
pub struct CovariateSchema {
    /// Resolved column specs, in declaration order
    pub features: Vec<FeatureSpec>,
    /// Total covariate vector length after one-hot expansion
    pub vector_len: usize,
}

impl CovariateSchema {
    /// Resolve the declared covariate columns against both input batches
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` if a declared column is absent from either
    /// batch, or carries a data type that cannot be encoded.
    pub fn build(
        treated: &RecordBatch,
        controls: &RecordBatch,
        config: &MatchingConfig,
    ) -> Result<Self> {
        let mut features = Vec::with_capacity(config.covariates.len());

        for name in &config.covariates {
            let treated_field = treated.schema().field_with_name(name).cloned().map_err(|_| {
                MatchError::SchemaMismatch(format!("Treated batch missing covariate column: {name}"))
            })?;
            if controls.schema().field_with_name(name).is_err() {
                return Err(MatchError::SchemaMismatch(format!(
                    "Control batch missing covariate column: {name}"
                )));
            }

            let kind = match treated_field.data_type() {
                DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
                | DataType::Boolean => FeatureKind::Numeric,
                DataType::Utf8 => {
                    let levels = collect_levels(treated, controls, name)?;
                    FeatureKind::Categorical(levels)
                }
                other => {
                    return Err(MatchError::SchemaMismatch(format!(
                        "Covariate column {name} has unsupported data type: {other:?}"
                    )));
                }
            };

            features.push(FeatureSpec {
                name: name.clone(),
                kind,
                weight: config.weight_for(name),
            });
        }

        let vector_len = features.iter().map(FeatureSpec::width).sum();

        Ok(Self {
            features,
            vector_len,
        })
    }

    /// Expanded feature names, one per vector slot
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.vector_len);
        for spec in &self.features {
            match &spec.kind {
                FeatureKind::Numeric => names.push(spec.name.clone()),
                FeatureKind::Categorical(levels) => {
                    for level in levels {
                        names.push(format!("{}_{level}", spec.name));
                    }
                }
            }
        }
        names
    }

    /// Per-slot distance weights, aligned with `feature_names`
    #[must_use]
    pub fn feature_weights(&self) -> Vec<f64> {
        let mut weights = Vec::with_capacity(self.vector_len);
        for spec in &self.features {
            for _ in 0..spec.width() {
                weights.push(spec.weight);
            }
        }
        weights
    }
}

/// Collect the sorted distinct non-null levels of a string column across
/// both batches
fn collect_levels(treated: &RecordBatch, controls: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let mut seen = FxHashSet::default();

    for batch in [treated, controls] {
        let idx = batch.schema().index_of(name).map_err(|_| {
            MatchError::SchemaMismatch(format!("Missing covariate column: {name}"))
        })?;
        let array = batch.column(idx);
        let strings = array
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                MatchError::SchemaMismatch(format!(
                    "Covariate column {name} is not a string array in both batches"
                ))
            })?;

        for i in 0..strings.len() {
            if !strings.is_null(i) {
                seen.insert(strings.value(i).to_string());
            }
        }
    }

    Ok(seen.into_iter().sorted().collect())
}
