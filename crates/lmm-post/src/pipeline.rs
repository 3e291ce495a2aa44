use lmm_core::{load_column, DrawStore, ParamKey, PosteriorError, DEFAULT_SEED};
use lmm_corr::{derive_correlation, derive_covariance};
use lmm_ppc::{replicates_from_store, PredictiveChecker};
use lmm_summary::SummaryEngine;
use tracing::info;

use crate::config::{AnalysisConfig, CorrelationConfig, PredictiveConfig};
use crate::report::{make_provenance, AnalysisReport, CorrelationReport, PredictiveReport};

/// Runs every step an analysis file asks for and assembles the report.
pub fn analyze(
    store: &DrawStore,
    config: &AnalysisConfig,
    sources: &[String],
) -> Result<AnalysisReport, PosteriorError> {
    config.validate()?;
    let engine = SummaryEngine::new(config.summary_options())?;

    let summaries = engine.summarize_all(store, &config.parameters)?;
    info!(parameters = summaries.len(), draws = store.draw_count(), "summarised draws");

    let correlations = config
        .correlations
        .iter()
        .map(|correlation| summarize_correlation(&engine, store, correlation))
        .collect::<Result<Vec<_>, _>>()?;

    let predictive = config
        .predictive
        .as_ref()
        .map(|predictive| check_predictive(store, predictive))
        .transpose()?;

    let seed = config
        .predictive
        .as_ref()
        .map_or(DEFAULT_SEED, PredictiveConfig::seed);
    AnalysisReport::new(
        make_provenance(store, sources, seed),
        summaries,
        correlations,
        predictive,
    )
}

/// Derives and summarises one configured correlation.
pub fn summarize_correlation(
    engine: &SummaryEngine,
    store: &DrawStore,
    config: &CorrelationConfig,
) -> Result<CorrelationReport, PosteriorError> {
    let pair = config.zero_based_pair();
    let derived = derive_correlation(store, &config.factor, pair, &config.name)?;
    let correlation = engine.summarize(&derived, &ParamKey::scalar(config.name.as_str()))?;

    let covariance = match &config.scales {
        Some(scales) => {
            let name = config.covariance_name();
            let derived = derive_covariance(store, &config.factor, scales, pair, &name)?;
            Some(engine.summarize(&derived, &ParamKey::scalar(name))?)
        }
        None => None,
    };
    info!(
        name = %config.name,
        factor = %config.factor,
        mean = correlation.mean,
        "derived correlation"
    );

    Ok(CorrelationReport {
        name: config.name.clone(),
        factor: config.factor.clone(),
        pair: config.pair,
        correlation,
        covariance,
    })
}

/// Loads the observed column and compares it against the replicates in `store`.
pub fn check_predictive(
    store: &DrawStore,
    config: &PredictiveConfig,
) -> Result<PredictiveReport, PosteriorError> {
    let statistic = config.statistic()?;
    let observed = load_column(&config.observed, &config.column)?;
    let replicates = replicates_from_store(store, &config.replicates)?;
    let checker = PredictiveChecker::new(observed, replicates)?;
    let check = checker.check(&statistic)?;
    let subset = config
        .subset
        .map(|count| checker.sample_indices(count, config.seed()))
        .unwrap_or_default();
    info!(
        statistic = %check.statistic,
        p_value = check.p_value,
        replicates = checker.replicates().len(),
        "posterior predictive check"
    );

    Ok(PredictiveReport {
        replicates: config.replicates.clone(),
        column: config.column.clone(),
        check,
        subset,
    })
}
