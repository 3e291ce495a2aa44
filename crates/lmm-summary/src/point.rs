use lmm_core::{check_draws, PosteriorError};
use serde::{Deserialize, Serialize};

use crate::interval::{quantile_sorted, sorted};

/// Caller-selectable point estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointEstimate {
    /// Sample mean.
    #[default]
    Mean,
    /// Sample median (0.5 quantile under linear interpolation).
    Median,
}

/// Computes the requested point estimate of a draw sequence.
pub fn point_estimate(draws: &[f64], kind: PointEstimate) -> Result<f64, PosteriorError> {
    check_draws("draws", draws)?;
    Ok(match kind {
        PointEstimate::Mean => mean(draws),
        PointEstimate::Median => quantile_sorted(&sorted(draws), 0.5),
    })
}

/// Sample mean; NaN for an empty slice.
pub fn mean(draws: &[f64]) -> f64 {
    draws.iter().sum::<f64>() / draws.len() as f64
}

/// Sample standard deviation with the `n - 1` denominator (0 for one draw).
pub fn standard_deviation(draws: &[f64]) -> f64 {
    if draws.len() < 2 {
        return 0.0;
    }
    let centre = mean(draws);
    let ss = draws.iter().map(|x| (x - centre).powi(2)).sum::<f64>();
    (ss / (draws.len() - 1) as f64).sqrt()
}

/// Fraction of draws strictly above `threshold`.
pub fn prob_greater(draws: &[f64], threshold: f64) -> Result<f64, PosteriorError> {
    check_draws("draws", draws)?;
    let above = draws.iter().filter(|&&value| value > threshold).count();
    Ok(above as f64 / draws.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_median_differ_on_skewed_draws() {
        let draws = [1.0, 2.0, 3.0, 10.0];
        assert_eq!(point_estimate(&draws, PointEstimate::Mean).unwrap(), 4.0);
        assert_eq!(point_estimate(&draws, PointEstimate::Median).unwrap(), 2.5);
    }

    #[test]
    fn standard_deviation_uses_sample_denominator() {
        let sd = standard_deviation(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(standard_deviation(&[3.0]), 0.0);
    }

    #[test]
    fn prob_greater_is_strict() {
        assert_eq!(prob_greater(&[-1.0, 0.0, 0.5, 2.0], 0.0).unwrap(), 0.5);
        assert!(prob_greater(&[], 0.0).is_err());
    }
}
