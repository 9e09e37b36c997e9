//! Core matching orchestration.
//!
//! The `Matcher` drives the pipeline end to end: validate the inputs, encode
//! both groups against a shared covariate schema, materialize the distance
//! matrix, run the configured assignment policy, and assemble the wide
//! output batch.

use arrow::array::{Array, BooleanArray, StringArray};
use arrow::compute;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::{info, warn};
use std::time::Instant;

use crate::assemble::assemble_output;
use crate::config::{AssignmentPolicy, MatchingConfig};
use crate::distance::{distance_matrix, distance_row};
use crate::encode::{CovariateSchema, encode_batch};
use crate::error::{MatchError, Result};
use crate::solver::pool::ControlPool;
use crate::solver::types::MatchingResult;
use crate::solver::{solve_greedy, solve_optimal};
use crate::utils::progress;

/// Matcher for pairing treated records with controls
#[derive(Debug)]
pub struct Matcher {
    /// Matching configuration
    config: MatchingConfig,
}

impl Matcher {
    // Threshold for switching the distance matrix to parallel computation
    const PARALLEL_THRESHOLD: usize = 1000;

    /// Create a new matcher with the given configuration
    #[must_use]
    pub const fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Split a combined dataset on its treatment column and match
    ///
    /// The treatment column must be Boolean or an integer 0/1 indicator.
    pub fn match_dataset(&self, dataset: &RecordBatch) -> Result<MatchingResult> {
        let (treated, controls) = split_by_treatment(dataset, &self.config.treatment_column)?;
        info!(
            "Split dataset into {} treated and {} control records",
            treated.num_rows(),
            controls.num_rows()
        );
        self.perform_matching(&treated, &controls)
    }

    /// Perform matching between a treated batch and a control batch
    ///
    /// # Errors
    ///
    /// `SchemaMismatch` if a declared column is missing from either batch,
    /// `EmptyControlPool` if there are no controls at all, and the solver
    /// errors of the configured policy.
    pub fn perform_matching(
        &self,
        treated: &RecordBatch,
        controls: &RecordBatch,
    ) -> Result<MatchingResult> {
        let start_time = Instant::now();

        self.config.validate()?;

        let treated_ids = extract_ids(treated, &self.config.id_column, "treated")?;
        let control_ids = extract_ids(controls, &self.config.id_column, "control")?;

        if controls.num_rows() == 0 {
            return Err(MatchError::EmptyControlPool);
        }

        info!(
            "Matching {} treated records against a pool of {} controls",
            treated_ids.len(),
            control_ids.len()
        );

        // Resolve one covariate schema for both groups
        let schema = CovariateSchema::build(treated, controls, &self.config)?;
        let weights = schema.feature_weights();

        let treated_encoded = encode_batch(treated, &schema, self.config.missing_value_policy)?;
        let control_encoded = encode_batch(controls, &schema, self.config.missing_value_policy)?;
        let filled_cells = treated_encoded.filled_cells + control_encoded.filled_cells;

        let pool = ControlPool::new(
            control_ids,
            control_encoded.vectors,
            (0..controls.num_rows()).collect(),
        );

        // Matrix columns follow pool (id-sorted) order so that nearest scans
        // tie-break on the lowest control id
        let use_parallel =
            self.config.use_parallel && treated_encoded.len() >= Self::PARALLEL_THRESHOLD;
        let distances = if use_parallel {
            info!(
                "Computing {}x{} distance matrix in parallel with {} threads",
                treated_encoded.len(),
                pool.len(),
                rayon::current_num_threads()
            );
            distance_matrix(&treated_encoded.vectors, &pool.vectors, &weights, true)
        } else {
            let pb = progress::create_main_progress_bar(
                treated_encoded.len() as u64,
                Some("Computing distances"),
            );
            let rows = treated_encoded
                .vectors
                .iter()
                .map(|vector| {
                    let row = distance_row(vector, &pool.vectors, &weights);
                    pb.inc(1);
                    row
                })
                .collect();
            progress::finish_progress_bar(&pb, Some("Distances ready"));
            rows
        };

        let (assignment, residual_pool) = match self.config.policy {
            AssignmentPolicy::GreedySequential => {
                solve_greedy(&treated_ids, &distances, pool, &self.config)?
            }
            AssignmentPolicy::GlobalOptimal => {
                solve_optimal(&treated_ids, &distances, pool, &self.config)?
            }
        };

        if !assignment.unmatched.is_empty() {
            warn!(
                "Control pool exhausted: {} treated records left unmatched",
                assignment.unmatched.len()
            );
        }

        let output = assemble_output(treated, controls, &assignment)?;

        let elapsed = start_time.elapsed();
        info!(
            "Matching complete: {} pairs, {} unmatched, {} controls residual in {:.2?}",
            assignment.pairs.len(),
            assignment.unmatched.len(),
            residual_pool.available_count(),
            elapsed
        );

        Ok(MatchingResult {
            output,
            pairs: assignment.pairs,
            unmatched: assignment.unmatched,
            filled_cells,
            matching_time: elapsed,
        })
    }
}

/// Extract the id column of a batch as owned strings
fn extract_ids(batch: &RecordBatch, id_column: &str, group: &str) -> Result<Vec<String>> {
    let idx = batch.schema().index_of(id_column).map_err(|_| {
        MatchError::SchemaMismatch(format!("{group} batch missing id column: {id_column}"))
    })?;

    let ids = batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            MatchError::SchemaMismatch(format!("Id column {id_column} is not a string array"))
        })?;

    let mut out = Vec::with_capacity(ids.len());
    for i in 0..ids.len() {
        if ids.is_null(i) {
            return Err(MatchError::SchemaMismatch(format!(
                "{group} batch has a null id at row {i}"
            )));
        }
        out.push(ids.value(i).to_string());
    }
    Ok(out)
}

/// Split a dataset into (treated, controls) on a binary treatment column
pub fn split_by_treatment(
    dataset: &RecordBatch,
    treatment_column: &str,
) -> Result<(RecordBatch, RecordBatch)> {
    let idx = dataset.schema().index_of(treatment_column).map_err(|_| {
        MatchError::SchemaMismatch(format!("Missing treatment column: {treatment_column}"))
    })?;
    let column = dataset.column(idx);

    let treated_mask = match column.data_type() {
        DataType::Boolean => {
            let flags = column
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| MatchError::SchemaMismatch("Array type mismatch".to_string()))?;
            let values: Vec<bool> = (0..flags.len())
                .map(|i| !flags.is_null(i) && flags.value(i))
                .collect();
            BooleanArray::from(values)
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            let mut values = Vec::with_capacity(dataset.num_rows());
            for i in 0..dataset.num_rows() {
                match crate::encode::encoder::numeric_cell(column, i)? {
                    Some(v) if v == 0.0 => values.push(false),
                    Some(v) if v == 1.0 => values.push(true),
                    Some(other) => {
                        return Err(MatchError::SchemaMismatch(format!(
                            "Treatment column {treatment_column} must be binary, found {other} at row {i}"
                        )));
                    }
                    None => values.push(false),
                }
            }
            BooleanArray::from(values)
        }
        other => {
            return Err(MatchError::SchemaMismatch(format!(
                "Treatment column {treatment_column} has unsupported data type: {other:?}"
            )));
        }
    };

    let control_mask = compute::not(&treated_mask)?;
    let treated = filter_batch(dataset, &treated_mask)?;
    let controls = filter_batch(dataset, &control_mask)?;
    Ok((treated, controls))
}

/// Filter every column of a batch through a boolean mask
fn filter_batch(batch: &RecordBatch, mask: &BooleanArray) -> Result<RecordBatch> {
    let columns = batch
        .columns()
        .iter()
        .map(|col| compute::filter(col, mask).map_err(MatchError::from))
        .collect::<Result<Vec<_>>>()?;
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}
