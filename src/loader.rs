//! Parquet loading and writing for the CLI.
//!
//! Matching itself is an in-memory transform; this module only moves record
//! batches in and out of Parquet files for the command-line front end.

use arrow::array::RecordBatchReader;
use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

use crate::error::{MatchError, Result};

/// Read a Parquet file into a single record batch
pub fn read_parquet(path: &Path) -> Result<RecordBatch> {
    let start = Instant::now();
    info!("Reading parquet file {}", path.display());

    let file = File::open(path).map_err(|e| {
        MatchError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Failed to open file {}: {e}", path.display()),
        ))
    })?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let schema = reader.schema();

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let combined = concat_batches(&schema, &batches)?;

    info!(
        "Read {} rows x {} columns in {:?}",
        combined.num_rows(),
        combined.num_columns(),
        start.elapsed()
    );

    Ok(combined)
}

/// Write a record batch to a Parquet file
pub fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    info!(
        "Writing {} rows to parquet file {}",
        batch.num_rows(),
        path.display()
    );

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;

    Ok(())
}
