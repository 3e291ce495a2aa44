use lmm_core::{DrawStore, ErrorInfo, ParamKey, PosteriorError};
use nalgebra::DMatrix;
use rayon::prelude::*;
use tracing::debug;

use crate::factor::{check_factor, factors_from_store, scales_from_store};

/// Implied matrix `Omega = L Lᵗ`.
pub fn implied_omega(factor: &DMatrix<f64>) -> DMatrix<f64> {
    factor * factor.transpose()
}

fn check_pair(dimension: usize, pair: (usize, usize), distinct: bool) -> Result<(), PosteriorError> {
    let (i, j) = pair;
    if (distinct && i == j) || i >= dimension || j >= dimension {
        return Err(PosteriorError::InvalidParameter(
            ErrorInfo::new("correlation-pair", "pair indices must lie below the dimension")
                .with_context("pair", format!("({i}, {j})"))
                .with_context("dimension", dimension.to_string()),
        ));
    }
    Ok(())
}

fn nonzero_diagonal(omega: &DMatrix<f64>, index: usize) -> Result<f64, PosteriorError> {
    let value = omega[(index, index)];
    if value == 0.0 {
        return Err(PosteriorError::DegenerateVariance(
            ErrorInfo::new("zero-variance", "implied variance is exactly zero")
                .with_context("index", index.to_string()),
        ));
    }
    Ok(value)
}

/// Factor with every row divided by its largest magnitude.
///
/// Correlations of `L Lᵗ` do not depend on row scale, and rows with entries
/// of magnitude at most 1 keep `Omega` clear of underflow and overflow.
/// All-zero rows stay zero.
fn row_normalized(factor: &DMatrix<f64>) -> DMatrix<f64> {
    let mut normalized = factor.clone();
    for mut row in normalized.row_iter_mut() {
        let largest = row.amax();
        if largest > 0.0 {
            row /= largest;
        }
    }
    normalized
}

/// Correlation `Omega[i,j] / sqrt(Omega[i,i] Omega[j,j])` for 0-based indices `(i, j)`.
pub fn correlation(factor: &DMatrix<f64>, pair: (usize, usize)) -> Result<f64, PosteriorError> {
    check_factor(factor)?;
    check_pair(factor.nrows(), pair, true)?;
    let omega = implied_omega(&row_normalized(factor));
    let (i, j) = pair;
    let denom = nonzero_diagonal(&omega, i)?.sqrt() * nonzero_diagonal(&omega, j)?.sqrt();
    Ok((omega[(i, j)] / denom).clamp(-1.0, 1.0))
}

/// Full correlation matrix implied by a factor.
pub fn correlation_matrix(factor: &DMatrix<f64>) -> Result<DMatrix<f64>, PosteriorError> {
    check_factor(factor)?;
    let omega = implied_omega(&row_normalized(factor));
    let n = omega.nrows();
    let scale = (0..n)
        .map(|i| nonzero_diagonal(&omega, i).map(f64::sqrt))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            1.0
        } else {
            (omega[(i, j)] / (scale[i] * scale[j])).clamp(-1.0, 1.0)
        }
    }))
}

/// Covariance matrix `diag(sd) Omega diag(sd)`.
///
/// `factor` is the Cholesky factor of a correlation matrix and `sd` the
/// standard deviations of the random effects it correlates.
pub fn covariance_matrix(factor: &DMatrix<f64>, sd: &[f64]) -> Result<DMatrix<f64>, PosteriorError> {
    check_factor(factor)?;
    let n = factor.nrows();
    if sd.len() != n {
        return Err(PosteriorError::Shape(
            ErrorInfo::new("scale-length", "one standard deviation per factor row is required")
                .with_context("dimension", n.to_string())
                .with_context("scales", sd.len().to_string()),
        ));
    }
    let diag = DMatrix::from_diagonal(&nalgebra::DVector::from_column_slice(sd));
    Ok(&diag * implied_omega(factor) * &diag)
}

/// Correlation for every factor draw, in draw order.
pub fn correlation_draws(
    factors: &[DMatrix<f64>],
    pair: (usize, usize),
) -> Result<Vec<f64>, PosteriorError> {
    factors
        .par_iter()
        .map(|factor| correlation(factor, pair))
        .collect()
}

/// Covariance entry `Sigma[i,j]` for every draw, in draw order.
pub fn covariance_draws(
    factors: &[DMatrix<f64>],
    scales: &[Vec<f64>],
    pair: (usize, usize),
) -> Result<Vec<f64>, PosteriorError> {
    if factors.len() != scales.len() {
        return Err(PosteriorError::Shape(
            ErrorInfo::new("scale-draw-count", "factor and scale draws differ in count")
                .with_context("factors", factors.len().to_string())
                .with_context("scales", scales.len().to_string()),
        ));
    }
    factors
        .par_iter()
        .zip(scales.par_iter())
        .map(|(factor, sd)| {
            check_pair(factor.nrows(), pair, false)?;
            let sigma = covariance_matrix(factor, sd)?;
            Ok(sigma[pair])
        })
        .collect()
}

/// Returns a copy of `store` with the correlation of `factor[pair]` added as scalar `name`.
///
/// The synthetic parameter carries the store's chain labels so it can be
/// summarised like any sampled parameter.
pub fn derive_correlation(
    store: &DrawStore,
    factor: &str,
    pair: (usize, usize),
    name: &str,
) -> Result<DrawStore, PosteriorError> {
    let factors = factors_from_store(store, factor)?;
    let draws = correlation_draws(&factors, pair)?;
    debug!(factor, name, draws = draws.len(), "derived correlation draws");
    let mut derived = store.clone();
    derived.insert(ParamKey::scalar(name), draws)?;
    Ok(derived)
}

/// Returns a copy of `store` with the covariance entry `Sigma[pair]` added as scalar `name`.
pub fn derive_covariance(
    store: &DrawStore,
    factor: &str,
    scales: &str,
    pair: (usize, usize),
    name: &str,
) -> Result<DrawStore, PosteriorError> {
    let factors = factors_from_store(store, factor)?;
    let sd = scales_from_store(store, scales)?;
    let draws = covariance_draws(&factors, &sd, pair)?;
    debug!(factor, scales, name, "derived covariance draws");
    let mut derived = store.clone();
    derived.insert(ParamKey::scalar(name), draws)?;
    Ok(derived)
}
