use lmm_core::{DrawStore, ParamKey};
use lmm_summary::{
    IntervalMethod, IntervalRequest, PointEstimate, SummaryEngine, SummaryOptions,
};

fn two_chain_store() -> DrawStore {
    let first: Vec<f64> = (0..20).map(|i| 6.0 + 0.01 * f64::from(i % 5)).collect();
    let second: Vec<f64> = (0..20).map(|i| 6.0 + 0.01 * f64::from((i + 2) % 5)).collect();
    let slope: Vec<f64> = (0..40).map(|i| if i % 4 == 0 { -0.01 } else { 0.03 }).collect();

    let mut store = DrawStore::new()
        .with_chains([vec![0; 20], vec![1; 20]].concat())
        .unwrap();
    store
        .insert(ParamKey::indexed("beta", &[1]), [first, second].concat())
        .unwrap();
    store
        .insert(ParamKey::indexed("beta", &[2]), slope)
        .unwrap();
    store
}

#[test]
fn summary_reports_moments_quantiles_and_intervals() {
    let store = two_chain_store();
    let engine = SummaryEngine::default();
    let summary = engine.summarize_named(&store, "beta[2]").unwrap();

    assert_eq!(summary.parameter, "beta[2]");
    assert_eq!(summary.draws, 40);
    assert!((summary.mean - 0.02).abs() < 1e-12);
    assert_eq!(summary.median, 0.03);
    assert_eq!(summary.point, summary.mean);
    assert_eq!(summary.quantiles.len(), 5);
    assert_eq!(summary.prob_positive, 0.75);
    assert!(summary.interval(0.95, IntervalMethod::Hpd).is_some());
    assert!(summary.interval(0.95, IntervalMethod::EqualTailed).is_some());
    assert!(summary.r_hat.is_some());
    assert!(summary.n_eff.is_some());
    assert!(summary.se_mean.is_some());
}

#[test]
fn summarize_all_keeps_store_order_in_parallel_and_serial() {
    let store = two_chain_store();
    let parallel = SummaryEngine::default().summarize_all(&store, &[]).unwrap();
    let serial = SummaryEngine::new(SummaryOptions {
        parallel: false,
        ..SummaryOptions::default()
    })
    .unwrap()
    .summarize_all(&store, &[])
    .unwrap();

    let names: Vec<_> = parallel.iter().map(|s| s.parameter.as_str()).collect();
    assert_eq!(names, vec!["beta[1]", "beta[2]"]);
    assert_eq!(parallel, serial);
}

#[test]
fn median_point_estimate_and_custom_intervals() {
    let store = two_chain_store();
    let engine = SummaryEngine::new(SummaryOptions {
        point: PointEstimate::Median,
        intervals: vec![IntervalRequest {
            coverage: 0.5,
            method: IntervalMethod::Hpd,
        }],
        quantiles: vec![0.5],
        ..SummaryOptions::default()
    })
    .unwrap();
    let summary = engine.summarize_named(&store, "beta[1]").unwrap();
    assert_eq!(summary.point, summary.median);
    assert_eq!(summary.intervals.len(), 1);
    assert_eq!(summary.quantiles[0].value, summary.median);
}

#[test]
fn unknown_parameters_fail_lookup() {
    let store = two_chain_store();
    let engine = SummaryEngine::default();
    assert!(engine.summarize_named(&store, "beta[3]").is_err());
    assert!(engine.summarize_named(&store, "sigma_e").is_err());
}

#[test]
fn summaries_serialize_with_kebab_case_methods() {
    let store = two_chain_store();
    let summary = SummaryEngine::default()
        .summarize_named(&store, "beta[1]")
        .unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["intervals"][0]["method"], "equal-tailed");
    assert_eq!(json["intervals"][1]["method"], "hpd");
    assert_eq!(json["point_kind"], "mean");
}

#[test]
fn non_finite_columns_fail_or_are_skipped_on_request() {
    let mut store = two_chain_store();
    let mut broken = vec![1.0; 40];
    broken[7] = f64::NAN;
    store.insert_scalar("sigma", broken).unwrap();

    let err = SummaryEngine::default().summarize_all(&store, &[]).unwrap_err();
    assert_eq!(err.info().code, "non-finite-draw");

    let engine = SummaryEngine::new(SummaryOptions {
        skip_non_finite: true,
        ..SummaryOptions::default()
    })
    .unwrap();
    let summaries = engine.summarize_all(&store, &[]).unwrap();
    let names: Vec<_> = summaries.iter().map(|s| s.parameter.as_str()).collect();
    assert_eq!(names, vec!["beta[1]", "beta[2]"]);
    assert!(engine.summarize_named(&store, "sigma").is_err());
}
