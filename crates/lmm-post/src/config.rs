use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use lmm_core::{ErrorInfo, PosteriorError, DEFAULT_SEED};
use lmm_ppc::Statistic;
use lmm_summary::{IntervalMethod, IntervalRequest, PointEstimate, SummaryOptions};
use serde::{Deserialize, Serialize};

fn config_error(code: &str, err: impl ToString) -> PosteriorError {
    PosteriorError::Serde(ErrorInfo::new(code, err.to_string()))
}

/// YAML-configurable description of one posterior analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Parameters to summarise; empty selects every parameter in the draws.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Point estimate reported for each parameter.
    #[serde(default)]
    pub point_estimate: PointEstimate,
    /// Coverage levels; each is combined with every entry of `methods`.
    #[serde(default = "default_coverages")]
    pub coverages: Vec<f64>,
    /// Interval construction methods.
    #[serde(default = "default_methods")]
    pub methods: Vec<IntervalMethod>,
    /// Quantile levels reported in the summary table.
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,
    /// R-hat above which a warning is logged.
    #[serde(default = "default_rhat_threshold")]
    pub rhat_threshold: f64,
    /// Correlations derived from Cholesky-factor draws.
    #[serde(default)]
    pub correlations: Vec<CorrelationConfig>,
    /// Optional posterior-predictive check.
    #[serde(default)]
    pub predictive: Option<PredictiveConfig>,
    /// Summarise parameters on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Leave parameters with non-finite draws out of the summary table.
    #[serde(default)]
    pub skip_non_finite: bool,
}

fn default_coverages() -> Vec<f64> {
    vec![0.95]
}

fn default_methods() -> Vec<IntervalMethod> {
    vec![IntervalMethod::EqualTailed, IntervalMethod::Hpd]
}

fn default_quantiles() -> Vec<f64> {
    vec![0.025, 0.25, 0.5, 0.75, 0.975]
}

fn default_rhat_threshold() -> f64 {
    1.1
}

fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parameters: Vec::new(),
            point_estimate: PointEstimate::default(),
            coverages: default_coverages(),
            methods: default_methods(),
            quantiles: default_quantiles(),
            rhat_threshold: default_rhat_threshold(),
            correlations: Vec::new(),
            predictive: None,
            parallel: default_parallel(),
            skip_non_finite: false,
        }
    }
}

/// One correlation to derive from a Cholesky factor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationConfig {
    /// Name of the derived parameter, e.g. `rho_u`.
    pub name: String,
    /// Base name of the factor parameter, e.g. `L_u`.
    pub factor: String,
    /// 1-based row/column pair, matching the indices in the draw file.
    pub pair: [usize; 2],
    /// Standard-deviation vector; when set the covariance `<name>_cov` is derived too.
    #[serde(default)]
    pub scales: Option<String>,
}

impl CorrelationConfig {
    /// The pair as 0-based matrix indices.
    pub fn zero_based_pair(&self) -> (usize, usize) {
        (self.pair[0].saturating_sub(1), self.pair[1].saturating_sub(1))
    }

    /// Name of the derived covariance parameter.
    pub fn covariance_name(&self) -> String {
        format!("{}_cov", self.name)
    }
}

/// Posterior-predictive check settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictiveConfig {
    /// Vector parameter holding replicated data per draw.
    #[serde(default = "default_replicates")]
    pub replicates: String,
    /// CSV file holding the observed data; relative paths are taken from the config file's directory.
    pub observed: PathBuf,
    /// Column of `observed` to compare against.
    pub column: String,
    /// Test statistic: `mean`, `sd`, `min`, `max` or `qNN`.
    #[serde(default = "default_statistic")]
    pub statistic: String,
    /// Number of replicates to draw for overlay output.
    #[serde(default)]
    pub subset: Option<usize>,
    /// Seed for the replicate subset.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_replicates() -> String {
    "y_rep".to_string()
}

fn default_statistic() -> String {
    "mean".to_string()
}

impl PredictiveConfig {
    /// Parsed test statistic.
    pub fn statistic(&self) -> Result<Statistic, PosteriorError> {
        Statistic::parse(&self.statistic)
    }

    /// Seed in effect, falling back to [`DEFAULT_SEED`].
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }
}

impl AnalysisConfig {
    /// Reads and validates a YAML analysis file.
    ///
    /// A relative `predictive.observed` path is resolved against the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self, PosteriorError> {
        let text = fs::read_to_string(path).map_err(|err| {
            PosteriorError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        if let (Some(predictive), Some(base)) = (config.predictive.as_mut(), path.parent()) {
            if predictive.observed.is_relative() {
                predictive.observed = base.join(&predictive.observed);
            }
        }
        Ok(config)
    }

    /// Parses and validates a YAML analysis description.
    pub fn from_yaml_str(text: &str) -> Result<Self, PosteriorError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|err| config_error("yaml-deserialize", err))?;
        config.validate()?;
        Ok(config)
    }

    /// Summary options implied by this configuration.
    pub fn summary_options(&self) -> SummaryOptions {
        let intervals = self
            .coverages
            .iter()
            .flat_map(|&coverage| {
                self.methods
                    .iter()
                    .map(move |&method| IntervalRequest { coverage, method })
            })
            .collect();
        SummaryOptions {
            point: self.point_estimate,
            intervals,
            quantiles: self.quantiles.clone(),
            rhat_threshold: self.rhat_threshold,
            parallel: self.parallel,
            skip_non_finite: self.skip_non_finite,
        }
    }

    /// Checks probabilities, correlation pairs and the predictive statistic.
    pub fn validate(&self) -> Result<(), PosteriorError> {
        self.summary_options().validate()?;

        let mut names = BTreeSet::new();
        for correlation in &self.correlations {
            let [i, j] = correlation.pair;
            if i == 0 || j == 0 || i == j {
                return Err(PosteriorError::InvalidParameter(
                    ErrorInfo::new("correlation-pair", "pair needs two distinct 1-based indices")
                        .with_context("name", correlation.name.as_str())
                        .with_context("pair", format!("[{i}, {j}]")),
                ));
            }
            if correlation.name.trim().is_empty() || !names.insert(correlation.name.as_str()) {
                return Err(PosteriorError::InvalidParameter(
                    ErrorInfo::new("correlation-name", "correlation names must be unique and non-empty")
                        .with_context("name", correlation.name.as_str()),
                ));
            }
        }

        if let Some(predictive) = &self.predictive {
            predictive.statistic()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_cover_every_coverage_and_method() {
        let config = AnalysisConfig {
            coverages: vec![0.5, 0.9],
            ..AnalysisConfig::default()
        };
        let options = config.summary_options();
        assert_eq!(options.intervals.len(), 4);
        assert_eq!(options.intervals[1].method, IntervalMethod::Hpd);
        assert_eq!(options.intervals[2].coverage, 0.9);
    }

    #[test]
    fn pairs_convert_to_zero_based() {
        let correlation = CorrelationConfig {
            name: "rho".into(),
            factor: "L_u".into(),
            pair: [2, 1],
            scales: None,
        };
        assert_eq!(correlation.zero_based_pair(), (1, 0));
        assert_eq!(correlation.covariance_name(), "rho_cov");
    }
}
