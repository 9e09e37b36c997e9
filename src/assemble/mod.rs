//! Result assembly for the matching pipeline.
//!
//! Joins each matched pair into one wide output row: the treated batch
//! passes through unchanged, the control side is gathered through a nullable
//! index array and appended with a `_matched` column suffix, and the realized
//! distance lands in a trailing `match_distance` column. Unmatched treated
//! rows carry nulls across the whole matched side. The transform is pure;
//! nothing outside the returned batch is touched.

use arrow::array::{Float64Array, UInt32Array};
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::error::Result;
use crate::solver::types::Assignment;

/// Suffix appended to control-side column names
pub const MATCHED_SUFFIX: &str = "_matched";

/// Name of the realized-distance column appended to the output
pub const DISTANCE_COLUMN: &str = "match_distance";

/// Assemble the wide output batch from an assignment
///
/// Produces one row per treated record, in treated batch row order.
pub fn assemble_output(
    treated: &RecordBatch,
    controls: &RecordBatch,
    assignment: &Assignment,
) -> Result<RecordBatch> {
    let num_rows = treated.num_rows();

    // Control row per treated row; None where unmatched
    let mut control_rows: Vec<Option<u32>> = vec![None; num_rows];
    let mut distances: Vec<Option<f64>> = vec![None; num_rows];
    for pair in &assignment.pairs {
        control_rows[pair.treated_row] = Some(u32::try_from(pair.control_row).unwrap_or(u32::MAX));
        distances[pair.treated_row] = Some(pair.distance);
    }

    let indices = UInt32Array::from(control_rows);

    let width = treated.num_columns() + controls.num_columns() + 1;
    let mut fields: Vec<Field> = Vec::with_capacity(width);
    let mut columns = Vec::with_capacity(width);

    for (field, column) in treated.schema().fields().iter().zip(treated.columns()) {
        fields.push(field.as_ref().clone());
        columns.push(Arc::clone(column));
    }

    // Null indices propagate as null output values through the take kernel,
    // which is exactly the unmatched-row semantics we need
    for (field, column) in controls.schema().fields().iter().zip(controls.columns()) {
        let taken = compute::take(column, &indices, None)?;
        fields.push(
            Field::new(
                format!("{}{MATCHED_SUFFIX}", field.name()),
                field.data_type().clone(),
                true,
            ),
        );
        columns.push(taken);
    }

    fields.push(Field::new(DISTANCE_COLUMN, DataType::Float64, true));
    columns.push(Arc::new(Float64Array::from(distances)));

    let schema = Arc::new(Schema::new(fields));
    Ok(RecordBatch::try_new(schema, columns)?)
}
