//! Historical CSV import.
//!
//! Loads a previous run's output file into the series store so it can be
//! plotted next to live data. One header row is skipped; each data row needs
//! at least four comma-separated fields, with field 0 as x (time) and field
//! 3 as y (the plotted value). The import is all-or-nothing: any row failure
//! aborts the whole load and nothing is committed to the store.

use crate::series::{DuplicateSeries, PlotPoint, Series, SeriesStore};
use std::path::Path;
use thiserror::Error;

/// CSV field index used for the x coordinate.
const X_FIELD: usize = 0;
/// CSV field index used for the y coordinate.
const Y_FIELD: usize = 3;

/// A failed historical import. Nothing was committed to the store.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The file could not be opened or a row could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// Path of the file being imported.
        path: String,
        /// Underlying CSV reader error.
        #[source]
        source: csv::Error,
    },

    /// A data row had fewer than four fields.
    #[error("Row {row} has {found} fields; at least 4 are required")]
    ShortRow {
        /// 1-based line number, counting the header.
        row: usize,
        /// Number of fields found.
        found: usize,
    },

    /// A plotted field failed the numeric parse.
    #[error("Row {row}, field {field}: '{value}' is not a number")]
    BadNumber {
        /// 1-based line number, counting the header.
        row: usize,
        /// 0-based field index.
        field: usize,
        /// The offending field text.
        value: String,
    },

    /// A series with this file's name is already loaded.
    #[error(transparent)]
    Duplicate(#[from] DuplicateSeries),
}

/// Imports `path` into `store` as a new series named after the file.
/// Returns the series name on success.
///
/// # Errors
///
/// Any [`ImportError`]; partial results are never applied.
pub fn load_csv(path: &Path, store: &SeriesStore) -> Result<String, ImportError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let read_error = |source| ImportError::Read {
        path: path.display().to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(read_error)?;

    let mut points = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row = index + 2; // 1-based, after the header line
        let record = record.map_err(read_error)?;
        if record.len() <= Y_FIELD {
            return Err(ImportError::ShortRow {
                row,
                found: record.len(),
            });
        }
        let x = parse_field(&record, row, X_FIELD)?;
        let y = parse_field(&record, row, Y_FIELD)?;
        points.push(PlotPoint::new(x, y));
    }

    store.insert(Series::with_points(name.clone(), points))?;
    tracing::info!(file = %path.display(), series = %name, "historical series loaded");
    Ok(name)
}

fn parse_field(
    record: &csv::StringRecord,
    row: usize,
    field: usize,
) -> Result<f64, ImportError> {
    let value = &record[field];
    value.parse::<f64>().map_err(|_| ImportError::BadNumber {
        row,
        field,
        value: value.to_string(),
    })
}
