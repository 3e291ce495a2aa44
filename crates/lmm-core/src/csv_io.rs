//! Loading draws and observed data from the sampling engine's CSV output.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::draws::{DrawStore, ParamKey};
use crate::errors::{ErrorInfo, PosteriorError};

fn csv_error(code: &str, err: impl ToString) -> PosteriorError {
    PosteriorError::Serde(ErrorInfo::new(code, err.to_string()))
}

fn open(path: &Path) -> Result<File, PosteriorError> {
    File::open(path).map_err(|err| {
        PosteriorError::Serde(
            ErrorInfo::new("file-open", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Reads one chain of draws: a header row of parameter names, then one row per draw.
///
/// Lines starting with `#` (engine configuration and adaptation notes) are skipped.
pub fn read_draws<R: Read>(reader: R) -> Result<DrawStore, PosteriorError> {
    let mut reader = reader_for(reader);
    let headers = reader
        .headers()
        .map_err(|err| csv_error("csv-header", err))?
        .clone();
    let keys = headers
        .iter()
        .map(ParamKey::parse)
        .collect::<Result<Vec<_>, _>>()?;
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); keys.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|err| csv_error("csv-record", err))?;
        if record.len() != keys.len() {
            return Err(PosteriorError::Shape(
                ErrorInfo::new("csv-row-width", "row width differs from header")
                    .with_context("row", (row + 1).to_string())
                    .with_context("expected", keys.len().to_string())
                    .with_context("found", record.len().to_string()),
            ));
        }
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            let value = field.parse::<f64>().map_err(|err| {
                PosteriorError::Serde(
                    ErrorInfo::new("csv-number", err.to_string())
                        .with_context("row", (row + 1).to_string())
                        .with_context("field", field),
                )
            })?;
            column.push(value);
        }
    }

    let mut store = DrawStore::new();
    for (key, column) in keys.into_iter().zip(columns) {
        store.insert(key, column)?;
    }
    Ok(store)
}

/// Loads one CSV file per chain and merges them into a chain-labelled store.
pub fn load_draws<P: AsRef<Path>>(paths: &[P]) -> Result<DrawStore, PosteriorError> {
    if paths.is_empty() {
        return Err(PosteriorError::InsufficientDraws(ErrorInfo::new(
            "no-draw-files",
            "at least one draw file is required",
        )));
    }
    let mut chains = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let store = read_draws(open(path)?)?;
        debug!(
            path = %path.display(),
            parameters = store.len(),
            draws = store.draw_count(),
            "loaded chain"
        );
        chains.push(store);
    }
    DrawStore::merge_chains(chains)
}

/// Reads one named numeric column from a CSV file with a header row.
pub fn read_column<R: Read>(reader: R, column: &str) -> Result<Vec<f64>, PosteriorError> {
    let mut reader = reader_for(reader);
    let headers = reader
        .headers()
        .map_err(|err| csv_error("csv-header", err))?
        .clone();
    let Some(position) = headers.iter().position(|name| name == column) else {
        return Err(PosteriorError::InvalidParameter(
            ErrorInfo::new("unknown-column", "column not present in header")
                .with_context("column", column),
        ));
    };
    let mut values = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|err| csv_error("csv-record", err))?;
        let field = record.get(position).unwrap_or_default();
        let value = field.parse::<f64>().map_err(|err| {
            PosteriorError::Serde(
                ErrorInfo::new("csv-number", err.to_string())
                    .with_context("row", (row + 1).to_string())
                    .with_context("column", column),
            )
        })?;
        values.push(value);
    }
    Ok(values)
}

/// Reads one named numeric column from a CSV file on disk.
pub fn load_column(path: &Path, column: &str) -> Result<Vec<f64>, PosteriorError> {
    read_column(open(path)?, column)
}
