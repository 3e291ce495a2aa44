#![deny(missing_docs)]

//! Posterior summaries: point estimates, equal-tailed and HPD credible
//! intervals, and chain diagnostics for draws held in a [`DrawStore`].
//!
//! Quantiles use linear interpolation between order statistics; HPD
//! intervals scan windows of `ceil(p * n)` sorted draws and keep the first
//! narrowest one.
//!
//! [`DrawStore`]: lmm_core::DrawStore

/// Split R-hat, effective sample size and Monte Carlo error.
pub mod diagnostics;
/// Quantiles and credible intervals.
pub mod interval;
/// Point estimates and simple moments.
pub mod point;
/// Parameter summary tables.
pub mod summary;

pub use diagnostics::{effective_sample_size, mcse_mean, split_rhat};
pub use interval::{
    credible_interval, equal_tailed, hpd, hpd_window, quantile, CredibleInterval, IntervalMethod,
};
pub use point::{point_estimate, prob_greater, standard_deviation, PointEstimate};
pub use summary::{
    select_keys, IntervalRequest, ParameterSummary, QuantileEstimate, SummaryEngine,
    SummaryOptions,
};
