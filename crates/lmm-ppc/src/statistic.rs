use std::fmt::{self, Display};

use lmm_core::{check_draws, check_probability, ErrorInfo, PosteriorError};
use lmm_summary::interval::{quantile_sorted, sorted};
use lmm_summary::point::{mean, standard_deviation};
use serde::{Deserialize, Serialize};

/// Scalar summary of a whole data set, compared between observed and replicated data.
pub trait TestStatistic: Send + Sync {
    /// Label used in reports.
    fn name(&self) -> String;

    /// Evaluates the statistic on one data set.
    fn compute(&self, data: &[f64]) -> Result<f64, PosteriorError>;
}

/// Built-in test statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Statistic {
    /// Arithmetic mean.
    Mean,
    /// Sample standard deviation.
    Sd,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Empirical quantile at `prob`, linearly interpolated.
    Quantile {
        /// Quantile level in `(0, 1)`.
        prob: f64,
    },
}

impl Statistic {
    /// Parses `mean`, `sd`, `min`, `max` or `qNN` where `NN` is a percentage (`q10`, `q2.5`).
    pub fn parse(text: &str) -> Result<Self, PosteriorError> {
        let text = text.trim().to_ascii_lowercase();
        let statistic = match text.as_str() {
            "mean" => Statistic::Mean,
            "sd" => Statistic::Sd,
            "min" => Statistic::Min,
            "max" => Statistic::Max,
            other => {
                let percent = other
                    .strip_prefix('q')
                    .and_then(|digits| digits.parse::<f64>().ok())
                    .ok_or_else(|| {
                        PosteriorError::InvalidParameter(
                            ErrorInfo::new("unknown-statistic", "unrecognised test statistic")
                                .with_context("statistic", other)
                                .with_hint("use mean, sd, min, max or qNN"),
                        )
                    })?;
                let prob = percent / 100.0;
                check_probability("quantile", prob)?;
                Statistic::Quantile { prob }
            }
        };
        Ok(statistic)
    }
}

impl Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Mean => write!(f, "mean"),
            Statistic::Sd => write!(f, "sd"),
            Statistic::Min => write!(f, "min"),
            Statistic::Max => write!(f, "max"),
            Statistic::Quantile { prob } => {
                let percent = (prob * 100.0 * 1e9).round() / 1e9;
                write!(f, "q{percent}")
            }
        }
    }
}

impl TestStatistic for Statistic {
    fn name(&self) -> String {
        self.to_string()
    }

    fn compute(&self, data: &[f64]) -> Result<f64, PosteriorError> {
        check_draws("data", data)?;
        Ok(match self {
            Statistic::Mean => mean(data),
            Statistic::Sd => standard_deviation(data),
            Statistic::Min => data.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Statistic::Quantile { prob } => {
                check_probability("quantile", *prob)?;
                quantile_sorted(&sorted(data), *prob)
            }
        })
    }
}

/// Test statistic backed by a closure.
pub struct FnStatistic<F> {
    name: String,
    func: F,
}

impl<F> FnStatistic<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    /// Wraps `func` under the label `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> TestStatistic for FnStatistic<F>
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn compute(&self, data: &[f64]) -> Result<f64, PosteriorError> {
        Ok((self.func)(data))
    }
}
