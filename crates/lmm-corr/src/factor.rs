use lmm_core::{DrawStore, ErrorInfo, PosteriorError};
use nalgebra::DMatrix;

/// Upper-triangle entries with a magnitude above this are rejected.
pub const TRIANGULAR_TOLERANCE: f64 = 1e-12;

fn invalid_factor(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

/// Checks that `factor` is a square lower-triangular matrix of dimension at least 2.
pub fn check_factor(factor: &DMatrix<f64>) -> Result<(), PosteriorError> {
    let (rows, cols) = factor.shape();
    if rows != cols {
        return Err(PosteriorError::InvalidParameter(
            invalid_factor("factor-not-square", "Cholesky factor must be square")
                .with_context("rows", rows.to_string())
                .with_context("cols", cols.to_string()),
        ));
    }
    if rows < 2 {
        return Err(PosteriorError::InvalidParameter(
            invalid_factor("factor-too-small", "correlations need a factor of dimension >= 2")
                .with_context("dimension", rows.to_string()),
        ));
    }
    if let Some(position) = factor.iter().position(|value| !value.is_finite()) {
        return Err(PosteriorError::InvalidParameter(
            invalid_factor("factor-non-finite", "Cholesky factor holds a non-finite entry")
                .with_context("row", (position % rows).to_string())
                .with_context("col", (position / rows).to_string()),
        ));
    }
    for row in 0..rows {
        for col in row + 1..cols {
            if factor[(row, col)].abs() > TRIANGULAR_TOLERANCE {
                return Err(PosteriorError::InvalidParameter(
                    invalid_factor("factor-not-lower-triangular", "entry above the diagonal")
                        .with_context("row", row.to_string())
                        .with_context("col", col.to_string()),
                ));
            }
        }
    }
    Ok(())
}

/// Assembles one Cholesky factor per draw from the elements `base[i,j]` of a store.
///
/// Elements missing from the store (typically the upper triangle) read as zero.
pub fn factors_from_store(
    store: &DrawStore,
    base: &str,
) -> Result<Vec<DMatrix<f64>>, PosteriorError> {
    let dims = store.dims(base)?;
    let [rows, cols] = dims.as_slice() else {
        return Err(PosteriorError::InvalidParameter(
            invalid_factor("factor-rank", "Cholesky factor parameter must be a matrix")
                .with_context("parameter", base)
                .with_context("rank", dims.len().to_string()),
        ));
    };
    let (rows, cols) = (*rows, *cols);
    let mut columns: Vec<Option<&[f64]>> = Vec::with_capacity(rows * cols);
    for r in 1..=rows {
        for c in 1..=cols {
            columns.push(store.get(base, &[r, c]).ok());
        }
    }

    let mut factors = Vec::with_capacity(store.draw_count());
    for iteration in 0..store.draw_count() {
        let factor = DMatrix::from_row_iterator(
            rows,
            cols,
            columns
                .iter()
                .map(|column| column.map(|draws| draws[iteration]).unwrap_or(0.0)),
        );
        check_factor(&factor)?;
        factors.push(factor);
    }
    Ok(factors)
}

/// Reads one standard-deviation vector per draw from the elements `base[i]` of a store.
pub fn scales_from_store(store: &DrawStore, base: &str) -> Result<Vec<Vec<f64>>, PosteriorError> {
    store.vector_draws(base)
}
