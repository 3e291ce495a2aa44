use std::fmt::{self, Display};

use lmm_core::{check_draws, check_probability, ErrorInfo, PosteriorError};
use serde::{Deserialize, Serialize};

/// Method used to construct a credible interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntervalMethod {
    /// Central interval between the `(1-p)/2` and `(1+p)/2` quantiles.
    EqualTailed,
    /// Narrowest interval holding a fraction `p` of the sorted draws.
    Hpd,
}

impl Display for IntervalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalMethod::EqualTailed => write!(f, "equal-tailed"),
            IntervalMethod::Hpd => write!(f, "hpd"),
        }
    }
}

/// Credible interval together with the coverage and method that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CredibleInterval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
    /// Nominal coverage probability in `(0, 1)`.
    pub coverage: f64,
    /// Construction method.
    pub method: IntervalMethod,
}

impl CredibleInterval {
    /// Distance between the bounds.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Returns `true` when `value` lies inside the closed interval.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Returns an ascending copy of the draws.
pub fn sorted(draws: &[f64]) -> Vec<f64> {
    let mut values = draws.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Linear interpolation between order statistics of an ascending sample.
///
/// Position `h = prob * (n - 1)`; the result is
/// `x[floor h] + (h - floor h) * (x[ceil h] - x[floor h])`.
/// `sorted` must be non-empty.
pub fn quantile_sorted(sorted: &[f64], prob: f64) -> f64 {
    let position = prob * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Empirical quantile of an unsorted draw sequence.
pub fn quantile(draws: &[f64], prob: f64) -> Result<f64, PosteriorError> {
    check_probability("quantile", prob)?;
    check_draws("draws", draws)?;
    Ok(quantile_sorted(&sorted(draws), prob))
}

/// Equal-tailed interval at `coverage`.
pub fn equal_tailed(draws: &[f64], coverage: f64) -> Result<CredibleInterval, PosteriorError> {
    check_probability("coverage", coverage)?;
    check_draws("draws", draws)?;
    Ok(equal_tailed_sorted(&sorted(draws), coverage))
}

pub(crate) fn equal_tailed_sorted(sorted: &[f64], coverage: f64) -> CredibleInterval {
    let tail = (1.0 - coverage) / 2.0;
    CredibleInterval {
        lower: quantile_sorted(sorted, tail),
        upper: quantile_sorted(sorted, 1.0 - tail),
        coverage,
        method: IntervalMethod::EqualTailed,
    }
}

/// Number of consecutive sorted draws an HPD window at `coverage` spans: `ceil(coverage * n)`.
///
/// A product a few ulps above an integer is rounding error from the
/// multiplication and rounds down to it, so `0.7 * 10` gives 7 rather than 8.
/// Anything further above takes the ceiling.
pub fn hpd_window(coverage: f64, n: usize) -> usize {
    let raw = coverage * n as f64;
    let floor = raw.floor();
    let window = if raw - floor <= raw * 4.0 * f64::EPSILON {
        floor
    } else {
        raw.ceil()
    };
    (window as usize).max(1)
}

/// Highest-posterior-density interval at `coverage`.
///
/// Scans every window of `ceil(coverage * n)` consecutive sorted draws and
/// returns the narrowest; ties go to the lowest window.
pub fn hpd(draws: &[f64], coverage: f64) -> Result<CredibleInterval, PosteriorError> {
    check_probability("coverage", coverage)?;
    check_draws("draws", draws)?;
    hpd_sorted(&sorted(draws), coverage)
}

pub(crate) fn hpd_sorted(sorted: &[f64], coverage: f64) -> Result<CredibleInterval, PosteriorError> {
    let n = sorted.len();
    let window = hpd_window(coverage, n);
    if n == 0 || window > n {
        return Err(PosteriorError::InsufficientDraws(
            ErrorInfo::new("hpd-window", "HPD window exceeds the number of draws")
                .with_context("window", window.to_string())
                .with_context("draws", n.to_string()),
        ));
    }
    let mut best = 0usize;
    let mut best_width = f64::INFINITY;
    for start in 0..=(n - window) {
        let width = sorted[start + window - 1] - sorted[start];
        if width < best_width {
            best_width = width;
            best = start;
        }
    }
    Ok(CredibleInterval {
        lower: sorted[best],
        upper: sorted[best + window - 1],
        coverage,
        method: IntervalMethod::Hpd,
    })
}

/// Builds an interval with the requested method.
pub fn credible_interval(
    draws: &[f64],
    coverage: f64,
    method: IntervalMethod,
) -> Result<CredibleInterval, PosteriorError> {
    match method {
        IntervalMethod::EqualTailed => equal_tailed(draws, coverage),
        IntervalMethod::Hpd => hpd(draws, coverage),
    }
}
