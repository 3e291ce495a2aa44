use lmm_core::{check_draws, check_probability, DrawStore, ErrorInfo, ParamKey, PosteriorError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::diagnostics::{effective_sample_size, mcse_mean, split_rhat};
use crate::interval::{
    equal_tailed_sorted, hpd_sorted, quantile_sorted, sorted, CredibleInterval, IntervalMethod,
};
use crate::point::{mean, standard_deviation, PointEstimate};

/// One requested interval: a coverage level and a construction method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalRequest {
    /// Coverage probability in `(0, 1)`.
    pub coverage: f64,
    /// Construction method.
    pub method: IntervalMethod,
}

/// Options controlling how parameters are summarised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOptions {
    /// Point estimate reported as `point`.
    #[serde(default)]
    pub point: PointEstimate,
    /// Intervals computed for every parameter.
    #[serde(default = "default_intervals")]
    pub intervals: Vec<IntervalRequest>,
    /// Quantile levels reported in the summary table.
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,
    /// R-hat above which a warning is logged.
    #[serde(default = "default_rhat_threshold")]
    pub rhat_threshold: f64,
    /// Summarise parameters on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Drop parameters with NaN or infinite draws from `summarize_all`
    /// instead of failing the whole table.
    #[serde(default)]
    pub skip_non_finite: bool,
}

fn default_intervals() -> Vec<IntervalRequest> {
    vec![
        IntervalRequest {
            coverage: 0.95,
            method: IntervalMethod::EqualTailed,
        },
        IntervalRequest {
            coverage: 0.95,
            method: IntervalMethod::Hpd,
        },
    ]
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

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            point: PointEstimate::default(),
            intervals: default_intervals(),
            quantiles: default_quantiles(),
            rhat_threshold: default_rhat_threshold(),
            parallel: default_parallel(),
            skip_non_finite: false,
        }
    }
}

impl SummaryOptions {
    /// Checks every coverage and quantile level.
    pub fn validate(&self) -> Result<(), PosteriorError> {
        for request in &self.intervals {
            check_probability("coverage", request.coverage)?;
        }
        for &prob in &self.quantiles {
            check_probability("quantile", prob)?;
        }
        if !(self.rhat_threshold > 0.0) {
            return Err(PosteriorError::InvalidParameter(
                ErrorInfo::new("rhat-threshold", "R-hat threshold must be positive")
                    .with_context("rhat_threshold", self.rhat_threshold.to_string()),
            ));
        }
        Ok(())
    }
}

/// One quantile level and its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileEstimate {
    /// Quantile level.
    pub prob: f64,
    /// Estimated value.
    pub value: f64,
}

/// Summary table row for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    /// Parameter name as written by the sampling engine.
    pub parameter: String,
    /// Number of draws summarised.
    pub draws: usize,
    /// Posterior mean.
    pub mean: f64,
    /// Posterior median.
    pub median: f64,
    /// Posterior standard deviation.
    pub sd: f64,
    /// Monte Carlo standard error of the mean.
    pub se_mean: Option<f64>,
    /// Selected point estimate kind.
    pub point_kind: PointEstimate,
    /// Value of the selected point estimate.
    pub point: f64,
    /// Requested quantiles.
    pub quantiles: Vec<QuantileEstimate>,
    /// Requested credible intervals, in request order.
    pub intervals: Vec<CredibleInterval>,
    /// Posterior probability that the parameter is positive.
    pub prob_positive: f64,
    /// Effective sample size pooled over chains.
    pub n_eff: Option<f64>,
    /// Split R-hat.
    pub r_hat: Option<f64>,
}

impl ParameterSummary {
    /// Finds the interval computed for `coverage` and `method`.
    pub fn interval(&self, coverage: f64, method: IntervalMethod) -> Option<&CredibleInterval> {
        self.intervals
            .iter()
            .find(|interval| interval.method == method && (interval.coverage - coverage).abs() < 1e-12)
    }
}

/// Computes summaries of draw sequences under a fixed set of options.
#[derive(Debug, Clone)]
pub struct SummaryEngine {
    options: SummaryOptions,
}

impl Default for SummaryEngine {
    fn default() -> Self {
        Self {
            options: SummaryOptions::default(),
        }
    }
}

impl SummaryEngine {
    /// Creates an engine after validating the options.
    pub fn new(options: SummaryOptions) -> Result<Self, PosteriorError> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Options in effect.
    pub fn options(&self) -> &SummaryOptions {
        &self.options
    }

    /// Summarises one parameter element of a store.
    pub fn summarize(
        &self,
        store: &DrawStore,
        key: &ParamKey,
    ) -> Result<ParameterSummary, PosteriorError> {
        let draws = store.get_key(key)?;
        self.summarize_chains(&key.to_string(), &store.split_by_chain(draws))
    }

    /// Summarises a parameter addressed by its textual name, e.g. `beta[2]`.
    pub fn summarize_named(
        &self,
        store: &DrawStore,
        name: &str,
    ) -> Result<ParameterSummary, PosteriorError> {
        self.summarize(store, &ParamKey::parse(name)?)
    }

    /// Summarises a single sequence of draws treated as one chain.
    pub fn summarize_draws(
        &self,
        name: &str,
        draws: &[f64],
    ) -> Result<ParameterSummary, PosteriorError> {
        self.summarize_chains(name, &[draws.to_vec()])
    }

    /// Summarises draws given per chain; summaries pool all chains.
    pub fn summarize_chains(
        &self,
        name: &str,
        chains: &[Vec<f64>],
    ) -> Result<ParameterSummary, PosteriorError> {
        let pooled: Vec<f64> = chains.iter().flatten().copied().collect();
        check_draws(name, &pooled)?;
        let ordered = sorted(&pooled);

        let mean = mean(&pooled);
        let median = quantile_sorted(&ordered, 0.5);
        let sd = standard_deviation(&pooled);
        let point = match self.options.point {
            PointEstimate::Mean => mean,
            PointEstimate::Median => median,
        };
        let quantiles = self
            .options
            .quantiles
            .iter()
            .map(|&prob| QuantileEstimate {
                prob,
                value: quantile_sorted(&ordered, prob),
            })
            .collect();
        let intervals = self
            .options
            .intervals
            .iter()
            .map(|request| match request.method {
                IntervalMethod::EqualTailed => Ok(equal_tailed_sorted(&ordered, request.coverage)),
                IntervalMethod::Hpd => hpd_sorted(&ordered, request.coverage),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let positive = pooled.iter().filter(|&&value| value > 0.0).count();

        let n_eff = effective_sample_size(chains);
        let r_hat = split_rhat(chains);
        if let Some(r_hat) = r_hat {
            if r_hat > self.options.rhat_threshold {
                warn!(
                    parameter = name,
                    r_hat,
                    threshold = self.options.rhat_threshold,
                    "chains have not mixed"
                );
            }
        }
        debug!(parameter = name, draws = pooled.len(), "summarised parameter");

        Ok(ParameterSummary {
            parameter: name.to_string(),
            draws: pooled.len(),
            mean,
            median,
            sd,
            se_mean: n_eff.and_then(|ess| mcse_mean(sd, ess)),
            point_kind: self.options.point,
            point,
            quantiles,
            intervals,
            prob_positive: positive as f64 / pooled.len() as f64,
            n_eff,
            r_hat,
        })
    }

    /// Summarises the selected parameters, or every parameter when `selection` is empty.
    ///
    /// A selection entry naming only a base (`beta`) expands to all of its
    /// elements. Output follows store order, whether or not the work ran in
    /// parallel. A parameter with non-finite draws fails the call unless
    /// `skip_non_finite` is set, in which case it is logged and left out.
    pub fn summarize_all(
        &self,
        store: &DrawStore,
        selection: &[String],
    ) -> Result<Vec<ParameterSummary>, PosteriorError> {
        let mut keys = select_keys(store, selection)?;
        if self.options.skip_non_finite {
            keys.retain(|key| match store.get_key(key) {
                Ok(draws) if draws.iter().any(|value| !value.is_finite()) => {
                    warn!(parameter = %key, "skipping parameter with non-finite draws");
                    false
                }
                _ => true,
            });
        }
        if self.options.parallel {
            keys.par_iter()
                .map(|key| self.summarize(store, key))
                .collect()
        } else {
            keys.iter().map(|key| self.summarize(store, key)).collect()
        }
    }
}

/// Resolves a list of parameter names against a store.
pub fn select_keys(store: &DrawStore, selection: &[String]) -> Result<Vec<ParamKey>, PosteriorError> {
    if selection.is_empty() {
        return Ok(store.keys().cloned().collect());
    }
    let mut keys = Vec::new();
    for name in selection {
        let key = ParamKey::parse(name)?;
        if key.is_scalar() && store.scalar(key.base()).is_err() && store.contains_base(key.base())
        {
            keys.extend(store.keys().filter(|k| k.base() == key.base()).cloned());
        } else {
            store.get_key(&key)?;
            keys.push(key);
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(SummaryOptions::default().validate().is_ok());
        let mut bad = SummaryOptions::default();
        bad.quantiles.push(1.0);
        assert!(SummaryEngine::new(bad).is_err());
    }

    #[test]
    fn base_selection_expands_to_elements() {
        let mut store = DrawStore::new();
        store.insert_scalar("alpha", vec![1.0]).unwrap();
        store
            .insert(ParamKey::indexed("beta", &[1]), vec![2.0])
            .unwrap();
        store
            .insert(ParamKey::indexed("beta", &[2]), vec![3.0])
            .unwrap();
        let keys = select_keys(&store, &["beta".to_string()]).unwrap();
        assert_eq!(keys.len(), 2);
        assert!(select_keys(&store, &["gamma".to_string()]).is_err());
        assert_eq!(select_keys(&store, &[]).unwrap().len(), 3);
    }
}
