//! Batch encoding against a resolved covariate schema.

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int8Array, Int16Array, Int32Array,
    Int64Array, StringArray, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::record_batch::RecordBatch;
use log::warn;
use smallvec::SmallVec;

use crate::config::MissingValuePolicy;
use crate::encode::schema::{CovariateSchema, FeatureKind};
use crate::error::{MatchError, Result};

/// Fixed-length numeric covariate vector for one record
pub type CovariateVector = SmallVec<[f64; 8]>;

/// Encoded covariate matrix for one record batch
#[derive(Debug, Clone)]
pub struct EncodedMatrix {
    /// One covariate vector per row, in batch row order
    pub vectors: Vec<CovariateVector>,
    /// Number of missing cells resolved by the fill policy
    pub filled_cells: usize,
}

impl EncodedMatrix {
    /// Number of encoded rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the matrix has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Encode every row of a batch into a covariate vector
///
/// Missing cells are resolved by the fill policy and counted; the count is
/// reported as a warning by the caller rather than silently dropped here.
pub fn encode_batch(
    batch: &RecordBatch,
    schema: &CovariateSchema,
    policy: MissingValuePolicy,
) -> Result<EncodedMatrix> {
    let num_rows = batch.num_rows();
    let mut vectors: Vec<CovariateVector> = (0..num_rows)
        .map(|_| CovariateVector::with_capacity(schema.vector_len))
        .collect();
    let mut filled_cells = 0usize;
    let fill = policy.fill_value();

    for spec in &schema.features {
        let idx = batch.schema().index_of(&spec.name).map_err(|_| {
            MatchError::SchemaMismatch(format!("Missing covariate column: {}", spec.name))
        })?;
        let column = batch.column(idx);

        match &spec.kind {
            FeatureKind::Numeric => {
                for (row, vector) in vectors.iter_mut().enumerate() {
                    match numeric_cell(column, row)? {
                        Some(value) => vector.push(value),
                        None => {
                            vector.push(fill);
                            filled_cells += 1;
                        }
                    }
                }
            }
            FeatureKind::Categorical(levels) => {
                let strings = column
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .ok_or_else(|| {
                        MatchError::SchemaMismatch(format!(
                            "Covariate column {} is not a string array",
                            spec.name
                        ))
                    })?;

                for (row, vector) in vectors.iter_mut().enumerate() {
                    if strings.is_null(row) {
                        // A missing category encodes as all-zero indicators
                        vector.extend(std::iter::repeat_n(0.0, levels.len()));
                        filled_cells += 1;
                    } else {
                        let value = strings.value(row);
                        for level in levels {
                            vector.push(if level == value { 1.0 } else { 0.0 });
                        }
                    }
                }
            }
        }
    }

    if filled_cells > 0 {
        warn!("Filled {filled_cells} missing covariate cells with the configured fill policy");
    }

    Ok(EncodedMatrix {
        vectors,
        filled_cells,
    })
}

/// Read one numeric or boolean cell as `f64`, `None` when null
pub(crate) fn numeric_cell(array: &ArrayRef, row: usize) -> Result<Option<f64>> {
    use arrow::datatypes::DataType;

    macro_rules! cell {
        ($arr_ty:ty, $conv:expr) => {{
            let typed = array
                .as_any()
                .downcast_ref::<$arr_ty>()
                .ok_or_else(|| MatchError::SchemaMismatch("Array type mismatch".to_string()))?;
            if typed.is_null(row) {
                None
            } else {
                Some($conv(typed.value(row)))
            }
        }};
    }

    let value = match array.data_type() {
        DataType::Int8 => cell!(Int8Array, f64::from),
        DataType::Int16 => cell!(Int16Array, f64::from),
        DataType::Int32 => cell!(Int32Array, f64::from),
        DataType::Int64 => cell!(Int64Array, |v| v as f64),
        DataType::UInt8 => cell!(UInt8Array, f64::from),
        DataType::UInt16 => cell!(UInt16Array, f64::from),
        DataType::UInt32 => cell!(UInt32Array, f64::from),
        DataType::UInt64 => cell!(UInt64Array, |v| v as f64),
        DataType::Float32 => cell!(Float32Array, f64::from),
        DataType::Float64 => cell!(Float64Array, |v: f64| v),
        DataType::Boolean => cell!(BooleanArray, |v: bool| if v { 1.0 } else { 0.0 }),
        other => {
            return Err(MatchError::SchemaMismatch(format!(
                "Unsupported numeric data type: {other:?}"
            )));
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingConfig;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch(regions: Vec<Option<&str>>, ages: Vec<Option<f64>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("region", DataType::Utf8, true),
            Field::new("age", DataType::Float64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(regions)),
                Arc::new(Float64Array::from(ages)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_encode_numeric_and_one_hot() {
        let treated = batch(vec![Some("north"), Some("south")], vec![Some(30.0), Some(40.0)]);
        let controls = batch(vec![Some("south")], vec![Some(35.0)]);
        let config = MatchingConfig::builder().covariates(["age", "region"]).build();
        let schema = CovariateSchema::build(&treated, &controls, &config).unwrap();

        let encoded = encode_batch(&treated, &schema, MissingValuePolicy::ZeroFill).unwrap();

        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.filled_cells, 0);
        assert_eq!(encoded.vectors[0].as_slice(), &[30.0, 1.0, 0.0]);
        assert_eq!(encoded.vectors[1].as_slice(), &[40.0, 0.0, 1.0]);
    }

    #[test]
    fn test_encode_counts_filled_cells() {
        let treated = batch(vec![None, Some("north")], vec![None, Some(40.0)]);
        let controls = batch(vec![Some("north")], vec![Some(35.0)]);
        let config = MatchingConfig::builder().covariates(["age", "region"]).build();
        let schema = CovariateSchema::build(&treated, &controls, &config).unwrap();

        let encoded = encode_batch(&treated, &schema, MissingValuePolicy::FillWith(-1.0)).unwrap();

        assert_eq!(encoded.filled_cells, 2);
        // Missing numeric takes the fill constant; missing category is all-zero
        assert_eq!(encoded.vectors[0].as_slice(), &[-1.0, 0.0]);
        assert_eq!(encoded.vectors[1].as_slice(), &[40.0, 1.0]);
    }
}
