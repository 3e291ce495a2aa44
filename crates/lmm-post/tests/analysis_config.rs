use std::fs;

use lmm_core::{PosteriorError, DEFAULT_SEED};
use lmm_post::AnalysisConfig;
use lmm_summary::{IntervalMethod, PointEstimate};
use tempfile::TempDir;

#[test]
fn empty_document_takes_defaults() {
    let config = AnalysisConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, AnalysisConfig::default());
    assert_eq!(config.coverages, vec![0.95]);
    assert_eq!(
        config.methods,
        vec![IntervalMethod::EqualTailed, IntervalMethod::Hpd]
    );
    assert_eq!(config.quantiles, vec![0.025, 0.25, 0.5, 0.75, 0.975]);
    assert_eq!(config.rhat_threshold, 1.1);
    assert!(config.parallel);
    assert!(config.predictive.is_none());
    assert!(!config.summary_options().skip_non_finite);
}

#[test]
fn full_document_parses() {
    let yaml = r#"
parameters: [beta, sigma_e]
point_estimate: median
coverages: [0.5, 0.9]
methods: [hpd]
parallel: false
correlations:
  - name: rho_u
    factor: L_u
    pair: [2, 1]
    scales: sigma_u
predictive:
  observed: data/observed.csv
  column: rt
  statistic: q90
  subset: 20
"#;
    let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.point_estimate, PointEstimate::Median);
    assert_eq!(config.summary_options().intervals.len(), 2);
    assert_eq!(config.correlations[0].zero_based_pair(), (1, 0));
    assert_eq!(config.correlations[0].scales.as_deref(), Some("sigma_u"));

    let predictive = config.predictive.unwrap();
    assert_eq!(predictive.replicates, "y_rep");
    assert_eq!(predictive.subset, Some(20));
    assert_eq!(predictive.seed(), DEFAULT_SEED);
    assert_eq!(predictive.statistic().unwrap().to_string(), "q90");
}

#[test]
fn out_of_range_coverage_is_rejected() {
    let err = AnalysisConfig::from_yaml_str("coverages: [1.5]").unwrap_err();
    assert!(matches!(err, PosteriorError::InvalidParameter(_)));
}

#[test]
fn correlation_pairs_must_be_distinct_and_one_based() {
    for pair in ["[1, 1]", "[0, 2]"] {
        let yaml = format!("correlations:\n  - {{ name: rho, factor: L, pair: {pair} }}\n");
        let err = AnalysisConfig::from_yaml_str(&yaml).unwrap_err();
        assert_eq!(err.info().code, "correlation-pair");
    }
}

#[test]
fn unknown_statistic_is_rejected() {
    let yaml = "predictive: { observed: y.csv, column: y, statistic: kurtosis }";
    let err = AnalysisConfig::from_yaml_str(yaml).unwrap_err();
    assert_eq!(err.info().code, "unknown-statistic");
}

#[test]
fn malformed_yaml_is_a_serde_error() {
    let err = AnalysisConfig::from_yaml_str("coverages: [0.9").unwrap_err();
    assert!(matches!(err, PosteriorError::Serde(_)));
}

#[test]
fn skip_non_finite_reaches_summary_options() {
    let config = AnalysisConfig::from_yaml_str("skip_non_finite: true").unwrap();
    assert!(config.summary_options().skip_non_finite);
}

#[test]
fn misspelled_keys_are_rejected() {
    let err = AnalysisConfig::from_yaml_str("coverage: [0.9]").unwrap_err();
    assert!(matches!(err, PosteriorError::Serde(_)));
    let yaml = "predictive: { observed: y.csv, column: y, statstic: mean }";
    assert!(AnalysisConfig::from_yaml_str(yaml).is_err());
}

#[test]
fn observed_path_is_relative_to_the_config_file() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("analysis");
    fs::create_dir_all(&nested).unwrap();
    let path = nested.join("config.yaml");
    fs::write(&path, "predictive: { observed: data/y.csv, column: y }\n").unwrap();
    let config = AnalysisConfig::load(&path).unwrap();
    assert_eq!(
        config.predictive.unwrap().observed,
        nested.join("data").join("y.csv")
    );

    let absolute = dir.path().join("y.csv");
    let yaml = format!("predictive: {{ observed: {}, column: y }}\n", absolute.display());
    fs::write(&path, yaml).unwrap();
    let config = AnalysisConfig::load(&path).unwrap();
    assert_eq!(config.predictive.unwrap().observed, absolute);
}
