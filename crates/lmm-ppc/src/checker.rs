use lmm_core::{derive_substream_seed, DrawStore, ErrorInfo, PosteriorError, RngHandle};
use lmm_summary::interval::{equal_tailed, CredibleInterval};
use lmm_summary::point::mean;
use rand::seq::index;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::statistic::TestStatistic;

/// One posterior-predictive data set, shaped like the observed data.
pub type ReplicateDataSet = Vec<f64>;

/// Substream used for replicate subset selection.
const SUBSET_STREAM: u64 = 0x5B5E7;

/// Outcome of comparing one test statistic between observed and replicated data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveCheck {
    /// Statistic label.
    pub statistic: String,
    /// `T(observed)`.
    pub observed: f64,
    /// `T(replicate[i])` for every replicate, in replicate order.
    pub replicated: Vec<f64>,
    /// Fraction of replicates with `T_rep > T_obs`.
    pub p_value: f64,
    /// Mean of the replicated statistic; `None` when any `T_rep` is not finite.
    pub replicated_mean: Option<f64>,
    /// Central 95% interval of the replicated statistic; `None` when any `T_rep` is not finite.
    pub replicated_interval: Option<CredibleInterval>,
}

/// Fraction of replicated statistics strictly above the observed one.
pub fn p_value(observed: f64, replicated: &[f64]) -> Result<f64, PosteriorError> {
    if replicated.is_empty() {
        return Err(empty_replicates());
    }
    let exceeding = replicated.iter().filter(|&&value| value > observed).count();
    Ok(exceeding as f64 / replicated.len() as f64)
}

fn empty_replicates() -> PosteriorError {
    PosteriorError::EmptyReplicateSet(ErrorInfo::new(
        "no-replicates",
        "a predictive check needs at least one replicate data set",
    ))
}

/// Compares observed data against posterior-predictive replicates.
#[derive(Debug, Clone)]
pub struct PredictiveChecker {
    observed: Vec<f64>,
    replicates: Vec<ReplicateDataSet>,
}

impl PredictiveChecker {
    /// Creates a checker; every replicate must match the observed length.
    pub fn new(
        observed: Vec<f64>,
        replicates: Vec<ReplicateDataSet>,
    ) -> Result<Self, PosteriorError> {
        if replicates.is_empty() {
            return Err(empty_replicates());
        }
        if let Some(position) = replicates
            .iter()
            .position(|replicate| replicate.len() != observed.len())
        {
            return Err(PosteriorError::Shape(
                ErrorInfo::new("replicate-length", "replicate differs in length from observed data")
                    .with_context("replicate", position.to_string())
                    .with_context("expected", observed.len().to_string())
                    .with_context("found", replicates[position].len().to_string()),
            ));
        }
        Ok(Self {
            observed,
            replicates,
        })
    }

    /// Observed data set.
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// All replicate data sets.
    pub fn replicates(&self) -> &[ReplicateDataSet] {
        &self.replicates
    }

    /// Evaluates `statistic` on the observed data and on every replicate.
    pub fn check(&self, statistic: &dyn TestStatistic) -> Result<PredictiveCheck, PosteriorError> {
        let observed = statistic.compute(&self.observed)?;
        let replicated = self
            .replicates
            .par_iter()
            .map(|replicate| statistic.compute(replicate))
            .collect::<Result<Vec<_>, _>>()?;
        let p_value = p_value(observed, &replicated)?;
        let all_finite = replicated.iter().all(|value| value.is_finite());
        let replicated_interval = if all_finite {
            Some(equal_tailed(&replicated, 0.95)?)
        } else {
            None
        };
        debug!(
            statistic = %statistic.name(),
            observed,
            p_value,
            replicates = replicated.len(),
            "predictive check"
        );
        Ok(PredictiveCheck {
            statistic: statistic.name(),
            observed,
            replicated_mean: all_finite.then(|| mean(&replicated)),
            replicated_interval,
            replicated,
            p_value,
        })
    }

    /// Picks up to `count` distinct replicate positions; the same seed gives the same positions.
    pub fn sample_indices(&self, count: usize, seed: u64) -> Vec<usize> {
        let amount = count.min(self.replicates.len());
        let mut rng = RngHandle::from_seed(derive_substream_seed(seed, SUBSET_STREAM));
        index::sample(rng.inner_mut(), self.replicates.len(), amount).into_vec()
    }

    /// Borrows a seeded subset of replicates, e.g. for overlay plots.
    pub fn sample(&self, count: usize, seed: u64) -> Vec<&[f64]> {
        self.sample_indices(count, seed)
            .into_iter()
            .map(|position| self.replicates[position].as_slice())
            .collect()
    }
}

/// Builds one replicate data set per draw from a vector parameter such as `y_rep`.
pub fn replicates_from_store(
    store: &DrawStore,
    base: &str,
) -> Result<Vec<ReplicateDataSet>, PosteriorError> {
    store.vector_draws(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistic::FnStatistic;

    #[test]
    fn p_value_counts_strict_exceedances() {
        assert_eq!(p_value(10.0, &[8.0, 9.0, 11.0, 12.0, 15.0]).unwrap(), 0.6);
        assert_eq!(p_value(10.0, &[10.0, 10.0]).unwrap(), 0.0);
        assert!(matches!(
            p_value(1.0, &[]),
            Err(PosteriorError::EmptyReplicateSet(_))
        ));
    }

    #[test]
    fn mismatched_replicates_are_rejected() {
        let err = PredictiveChecker::new(vec![1.0, 2.0], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, PosteriorError::Shape(_)));
        let err = PredictiveChecker::new(vec![1.0], Vec::new()).unwrap_err();
        assert!(matches!(err, PosteriorError::EmptyReplicateSet(_)));
    }

    #[test]
    fn infinite_statistics_keep_the_p_value() {
        let checker = PredictiveChecker::new(
            vec![1.0, 4.0],
            vec![vec![0.0, 1.0], vec![2.0, 3.0], vec![5.0, 6.0]],
        )
        .unwrap();
        let log_min = FnStatistic::new("log_min", |data: &[f64]| {
            data.iter().copied().fold(f64::INFINITY, f64::min).ln()
        });
        let check = checker.check(&log_min).unwrap();
        assert_eq!(check.observed, 0.0);
        assert_eq!(check.replicated[0], f64::NEG_INFINITY);
        assert!((check.p_value - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(check.replicated_mean, None);
        assert_eq!(check.replicated_interval, None);
    }
}
