use lmm_core::{DrawStore, ParamKey, PosteriorError};
use lmm_ppc::{p_value, replicates_from_store, PredictiveChecker, Statistic, TestStatistic};
use proptest::prelude::*;

fn checker() -> PredictiveChecker {
    let observed = vec![10.0, 10.0, 10.0];
    let replicates = [8.0, 9.0, 11.0, 12.0, 15.0]
        .iter()
        .map(|&level| vec![level; 3])
        .collect();
    PredictiveChecker::new(observed, replicates).unwrap()
}

#[test]
fn mean_check_reports_fraction_above_observed() {
    let check = checker().check(&Statistic::Mean).unwrap();
    assert_eq!(check.statistic, "mean");
    assert_eq!(check.observed, 10.0);
    assert_eq!(check.replicated, vec![8.0, 9.0, 11.0, 12.0, 15.0]);
    assert_eq!(check.p_value, 0.6);
    assert_eq!(check.replicated_mean, Some(11.0));
    assert!(check.replicated_interval.unwrap().contains(11.0));
}

#[test]
fn ties_with_observed_do_not_count() {
    let checker = PredictiveChecker::new(vec![2.0, 4.0], vec![vec![3.0, 3.0], vec![1.0, 5.0]])
        .unwrap();
    let check = checker.check(&Statistic::Mean).unwrap();
    assert_eq!(check.p_value, 0.0);
    let check = checker.check(&Statistic::Max).unwrap();
    assert_eq!(check.p_value, 0.5);
}

#[test]
fn subsets_are_seeded_and_leave_replicates_untouched() {
    let checker = checker();
    let first = checker.sample_indices(3, 7);
    assert_eq!(first, checker.sample_indices(3, 7));
    assert_eq!(first.len(), 3);
    let mut distinct = first.clone();
    distinct.sort_unstable();
    distinct.dedup();
    assert_eq!(distinct.len(), 3);
    assert!(first.iter().all(|&position| position < 5));

    assert_eq!(checker.sample_indices(50, 7).len(), 5);
    let borrowed = checker.sample(2, 11);
    assert_eq!(borrowed.len(), 2);
    assert_eq!(checker.replicates().len(), 5);
    assert_eq!(checker.replicates()[0], vec![8.0; 3]);
}

#[test]
fn replicates_come_from_vector_draws() {
    let mut store = DrawStore::new();
    store
        .insert(ParamKey::indexed("y_rep", &[1]), vec![1.0, 4.0])
        .unwrap();
    store
        .insert(ParamKey::indexed("y_rep", &[2]), vec![2.0, 6.0])
        .unwrap();
    let replicates = replicates_from_store(&store, "y_rep").unwrap();
    let checker = PredictiveChecker::new(vec![2.0, 3.0], replicates).unwrap();
    let check = checker.check(&Statistic::Mean).unwrap();
    assert_eq!(check.replicated, vec![1.5, 5.0]);
    assert_eq!(check.p_value, 0.5);
}

#[test]
fn empty_replicate_set_is_an_error() {
    let err = PredictiveChecker::new(vec![1.0], Vec::new()).unwrap_err();
    assert!(matches!(err, PosteriorError::EmptyReplicateSet(_)));
    assert_eq!(err.info().code, "no-replicates");
}

#[test]
fn check_serializes_for_reports() {
    let check = checker().check(&Statistic::Quantile { prob: 0.5 }).unwrap();
    let json = serde_json::to_value(&check).unwrap();
    assert_eq!(json["statistic"], "q50");
    assert_eq!(json["p_value"], 0.6);
}

proptest! {
    #[test]
    fn p_value_stays_in_unit_interval(
        observed in -50.0f64..50.0,
        replicated in proptest::collection::vec(-50.0f64..50.0, 1..64),
    ) {
        let p = p_value(observed, &replicated).unwrap();
        prop_assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn p_value_hits_bounds_when_one_sided(
        observed in -50.0f64..50.0,
        offsets in proptest::collection::vec(0.0f64..10.0, 1..32),
    ) {
        let below: Vec<f64> = offsets.iter().map(|o| observed - o).collect();
        prop_assert_eq!(p_value(observed, &below).unwrap(), 0.0);
        let above: Vec<f64> = offsets.iter().map(|o| observed + o + 1e-6).collect();
        prop_assert_eq!(p_value(observed, &above).unwrap(), 1.0);
    }

    #[test]
    fn statistic_labels_are_stable(prob in 0.01f64..0.99) {
        let statistic = Statistic::Quantile { prob };
        prop_assert_eq!(statistic.name(), statistic.to_string());
    }
}
