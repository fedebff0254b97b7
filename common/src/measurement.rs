use std::path::Path;

use eyre::{Context, Result};
use futures::future::join_all;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use thiserror::Error;
use tokio::fs::read_to_string;
use tracing::debug;

use crate::{THROUGHPUT_SCALE, config::RunGroup};

#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("measurement file has no data row")]
    MissingDataRow,
    #[error("data row has {found} fields, expected at least {expected}")]
    TooFewFields { found: usize, expected: usize },
    #[error("field {index} is not numeric: {value:?}")]
    NonNumeric { index: usize, value: String },
    #[error("elapsed time must be positive, got {elapsed}")]
    NonPositiveElapsed { elapsed: f64 },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Per-iteration throughput extracted from a single measurement file.
///
/// The benchmark writes one file per configuration: a header line it never
/// promises anything about, then a single data row laid out as
/// `config_value,elapsed_ms,lf_ops_0,lb_ops_0,...,lf_ops_{n-1},lb_ops_{n-1}`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementColumns {
    pub config_value: f64,
    pub elapsed_ms: f64,
    pub lock_free: Vec<f64>,
    pub lock_based: Vec<f64>,
}

pub fn parse_measurement(
    text: &str,
    iterations: usize,
) -> Result<MeasurementColumns, MeasurementError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();
    // header line, discarded unvalidated
    records.next();
    let record = records.next().ok_or(MeasurementError::MissingDataRow)??;

    let expected = 2 + 2 * iterations;
    if record.len() < expected {
        return Err(MeasurementError::TooFewFields {
            found: record.len(),
            expected,
        });
    }

    let field = |index: usize| -> Result<f64, MeasurementError> {
        let raw = &record[index];
        raw.trim().parse().map_err(|_| MeasurementError::NonNumeric {
            index,
            value: raw.to_owned(),
        })
    };

    let config_value = field(0)?;
    let elapsed_ms = field(1)?;
    if elapsed_ms <= 0.0 {
        return Err(MeasurementError::NonPositiveElapsed {
            elapsed: elapsed_ms,
        });
    }

    let mut lock_free = Vec::with_capacity(iterations);
    let mut lock_based = Vec::with_capacity(iterations);
    for j in 0..iterations {
        lock_free.push(field(2 + 2 * j)? / elapsed_ms * THROUGHPUT_SCALE);
        lock_based.push(field(2 + 2 * j + 1)? / elapsed_ms * THROUGHPUT_SCALE);
    }

    Ok(MeasurementColumns {
        config_value,
        elapsed_ms,
        lock_free,
        lock_based,
    })
}

/// Throughput values shaped (iterations x configurations); configuration
/// order equals the run group's file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputTable {
    rows: Vec<Vec<f64>>,
    columns: usize,
}

impl ThroughputTable {
    pub fn new(iterations: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![0.0; columns]; iterations],
            columns,
        }
    }

    pub fn set_column(&mut self, column: usize, values: &[f64]) {
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[column] = *value;
        }
    }

    pub fn column(&self, column: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[column]).collect()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn iterations(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunTables {
    pub lock_free: ThroughputTable,
    pub lock_based: ThroughputTable,
}

/// Reads every measurement file of a run group and assembles the lock-free
/// and lock-based throughput tables. Any unreadable or malformed file fails
/// the whole run.
pub async fn extract_run(data_path: &Path, run: &RunGroup) -> Result<RunTables> {
    debug!("Extracting {} files for run {}", run.files.len(), run.name);

    let reads = join_all(run.files.iter().map(|file| {
        let path = data_path.join(file);
        async move {
            let data = read_to_string(&path).await;
            (data, path)
        }
    }))
    .await;

    let mut contents = Vec::with_capacity(reads.len());
    for (data, path) in reads {
        contents.push(data.context(format!("Read measurement file {}", path.display()))?);
    }

    let columns = contents
        .into_par_iter()
        .enumerate()
        .map(|(i, text)| {
            parse_measurement(&text, run.iterations)
                .context(format!("Parse measurement file {}", run.files[i]))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut lock_free = ThroughputTable::new(run.iterations, run.files.len());
    let mut lock_based = ThroughputTable::new(run.iterations, run.files.len());
    for (i, column) in columns.iter().enumerate() {
        lock_free.set_column(i, &column.lock_free);
        lock_based.set_column(i, &column.lock_based);
    }

    Ok(RunTables {
        lock_free,
        lock_based,
    })
}
