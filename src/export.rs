//! Cleaned dataset export (Arrow/Parquet)
//!
//! Flattens a [`ResultStore`] into the tabular form consumed by the
//! dataset-cleaning and training collaborators:
//!
//! | Column            | Type    | Source                          |
//! |-------------------|---------|---------------------------------|
//! | `algorithm`       | Utf8    | algorithm name                  |
//! | `task_type`       | Utf8    | category tag                    |
//! | `dataset_size`    | UInt64  | input size                      |
//! | `avg_time_sec`    | Float64 | mean elapsed time               |
//! | `avg_cpu_percent` | Float64 | mean CPU delta                  |
//! | `avg_memory_mb`   | Float64 | mean memory delta / 1024²       |
//! | `energy_kwh`      | Float64 | hardware reading or estimate    |
//! | `carbon_gco2`     | Float64 | energy × intensity              |
//!
//! Rows whose energy or carbon is not strictly positive, or that carry a
//! non-finite value, are measurement anomalies and are dropped silently.

use crate::algorithms::AlgorithmCategory;
use crate::experiment::{AggregatedRecord, ResultStore};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Column names of the cleaned dataset, in order.
pub const SCHEMA: [&str; 8] = [
    "algorithm",
    "task_type",
    "dataset_size",
    "avg_time_sec",
    "avg_cpu_percent",
    "avg_memory_mb",
    "energy_kwh",
    "carbon_gco2",
];

/// One row of the cleaned dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    /// Algorithm name
    pub algorithm: String,
    /// Category
    pub task_type: AlgorithmCategory,
    /// Input size
    pub dataset_size: usize,
    /// Mean elapsed time (s)
    pub avg_time_sec: f64,
    /// Mean CPU delta (%)
    pub avg_cpu_percent: f64,
    /// Mean memory delta (MB)
    pub avg_memory_mb: f64,
    /// Energy (kWh)
    pub energy_kwh: f64,
    /// Emissions (gCO2)
    pub carbon_gco2: f64,
}

impl From<&AggregatedRecord> for DatasetRow {
    fn from(record: &AggregatedRecord) -> Self {
        Self {
            algorithm: record.algorithm().to_string(),
            task_type: record.category(),
            dataset_size: record.size(),
            avg_time_sec: record.avg_time(),
            avg_cpu_percent: record.avg_cpu(),
            avg_memory_mb: record.avg_memory_mb(),
            energy_kwh: record.energy_kwh(),
            carbon_gco2: record.carbon_gco2(),
        }
    }
}

impl DatasetRow {
    /// Check that the row is a usable measurement.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let finite = [
            self.avg_time_sec,
            self.avg_cpu_percent,
            self.avg_memory_mb,
            self.energy_kwh,
            self.carbon_gco2,
        ]
        .iter()
        .all(|v| v.is_finite());
        finite && self.energy_kwh > 0.0 && self.carbon_gco2 > 0.0
    }
}

/// Flatten `store` into cleaned rows, dropping anomalies.
#[must_use]
pub fn build_rows(store: &ResultStore) -> Vec<DatasetRow> {
    let rows: Vec<DatasetRow> = store
        .records()
        .iter()
        .map(DatasetRow::from)
        .filter(DatasetRow::is_valid)
        .collect();
    debug!(
        kept = rows.len(),
        dropped = store.len() - rows.len(),
        "cleaned dataset rows"
    );
    rows
}

/// Arrow schema of the cleaned dataset.
#[must_use]
pub fn arrow_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(SCHEMA[0], DataType::Utf8, false),
        Field::new(SCHEMA[1], DataType::Utf8, false),
        Field::new(SCHEMA[2], DataType::UInt64, false),
        Field::new(SCHEMA[3], DataType::Float64, false),
        Field::new(SCHEMA[4], DataType::Float64, false),
        Field::new(SCHEMA[5], DataType::Float64, false),
        Field::new(SCHEMA[6], DataType::Float64, false),
        Field::new(SCHEMA[7], DataType::Float64, false),
    ]))
}

/// Build an Arrow batch from rows.
///
/// # Errors
/// Returns `Arrow` if the batch cannot be assembled.
pub fn to_record_batch(rows: &[DatasetRow]) -> Result<RecordBatch> {
    let float_column = |f: fn(&DatasetRow) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.algorithm.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.task_type.as_str()))),
        Arc::new(UInt64Array::from_iter_values(rows.iter().map(|r| r.dataset_size as u64))),
        float_column(|r| r.avg_time_sec),
        float_column(|r| r.avg_cpu_percent),
        float_column(|r| r.avg_memory_mb),
        float_column(|r| r.energy_kwh),
        float_column(|r| r.carbon_gco2),
    ];

    Ok(RecordBatch::try_new(arrow_schema(), columns)?)
}

/// Decode rows from a batch with the cleaned-dataset schema.
///
/// # Errors
/// - `InvalidInput` if a column is missing or has the wrong type
/// - `InvalidCategory` if a `task_type` value is not a known tag
pub fn from_record_batch(batch: &RecordBatch) -> Result<Vec<DatasetRow>> {
    let algorithm: &StringArray = column(batch, SCHEMA[0])?;
    let task_type: &StringArray = column(batch, SCHEMA[1])?;
    let dataset_size: &UInt64Array = column(batch, SCHEMA[2])?;
    let avg_time: &Float64Array = column(batch, SCHEMA[3])?;
    let avg_cpu: &Float64Array = column(batch, SCHEMA[4])?;
    let avg_memory: &Float64Array = column(batch, SCHEMA[5])?;
    let energy: &Float64Array = column(batch, SCHEMA[6])?;
    let carbon: &Float64Array = column(batch, SCHEMA[7])?;

    (0..batch.num_rows())
        .map(|i| {
            let dataset_size = usize::try_from(dataset_size.value(i)).map_err(|_| {
                Error::InvalidInput(format!("dataset_size {} does not fit", dataset_size.value(i)))
            })?;
            Ok(DatasetRow {
                algorithm: algorithm.value(i).to_string(),
                task_type: task_type.value(i).parse()?,
                dataset_size,
                avg_time_sec: avg_time.value(i),
                avg_cpu_percent: avg_cpu.value(i),
                avg_memory_mb: avg_memory.value(i),
                energy_kwh: energy.value(i),
                carbon_gco2: carbon.value(i),
            })
        })
        .collect()
}

fn column<'b, T: Array + 'static>(batch: &'b RecordBatch, name: &str) -> Result<&'b T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| Error::InvalidInput(format!("column '{name}' is missing or mistyped")))
}

/// Write rows to a Parquet file.
///
/// # Errors
/// Returns `Io` if the file cannot be created, `Parquet`/`Arrow` on encoding
/// failures.
pub fn write_parquet<P: AsRef<Path>>(path: P, rows: &[DatasetRow]) -> Result<()> {
    let batch = to_record_batch(rows)?;
    let file = File::create(path.as_ref())?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    debug!(path = %path.as_ref().display(), rows = rows.len(), "wrote cleaned dataset");
    Ok(())
}

/// Read rows back from a Parquet file.
///
/// # Errors
/// Returns `Io` if the file cannot be opened, `Parquet`/`Arrow` on decoding
/// failures, otherwise as [`from_record_batch`].
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<DatasetRow>> {
    let file = File::open(path.as_ref())?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        rows.extend(from_record_batch(&batch?)?);
    }
    Ok(rows)
}

/// Persist the nested raw layout of `store` as JSON.
///
/// # Errors
/// Returns `Io` or `Json` on failure.
pub fn write_raw_json<P: AsRef<Path>>(path: P, store: &ResultStore) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, &store.to_raw_json()?)?;
    writer.flush()?;
    Ok(())
}

/// Load a store from a raw-layout JSON file.
///
/// # Errors
/// Returns `Io` or `Json` on failure, otherwise as
/// [`ResultStore::from_raw_json`].
pub fn read_raw_json<P: AsRef<Path>>(path: P) -> Result<ResultStore> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let value: serde_json::Value = serde_json::from_reader(reader)?;
    ResultStore::from_raw_json(&value)
}
