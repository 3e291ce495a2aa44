#![deny(missing_docs)]
#![doc = "Posterior-predictive checks: test statistics over observed and replicated data sets."]

/// Predictive checker, p-values and replicate subsets.
pub mod checker;
/// Built-in and closure-backed test statistics.
pub mod statistic;

pub use checker::{
    p_value, replicates_from_store, PredictiveCheck, PredictiveChecker, ReplicateDataSet,
};
pub use statistic::{FnStatistic, Statistic, TestStatistic};
