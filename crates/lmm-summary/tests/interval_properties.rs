use lmm_summary::{equal_tailed, hpd, hpd_window, point_estimate, PointEstimate};
use proptest::prelude::*;

fn draws_strategy() -> impl Strategy<Value = Vec<f64>> {
    proptest::collection::vec(-1.0e3f64..1.0e3, 1..200)
}

fn widest_window_gap(sorted: &[f64], window: usize) -> f64 {
    sorted
        .windows(window)
        .map(|w| w[window - 1] - w[0])
        .fold(f64::NEG_INFINITY, f64::max)
}

proptest! {
    #[test]
    fn median_lies_inside_equal_tailed_interval(draws in draws_strategy(), coverage in 0.01f64..0.99) {
        let interval = equal_tailed(&draws, coverage).unwrap();
        let median = point_estimate(&draws, PointEstimate::Median).unwrap();
        prop_assert!(interval.lower <= median && median <= interval.upper);
    }

    #[test]
    fn hpd_is_the_narrowest_window(draws in draws_strategy(), coverage in 0.01f64..0.99) {
        let interval = hpd(&draws, coverage).unwrap();
        let mut sorted = draws.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let window = hpd_window(coverage, sorted.len());
        for w in sorted.windows(window) {
            prop_assert!(interval.width() <= w[window - 1] - w[0]);
        }
        prop_assert!(interval.width() <= widest_window_gap(&sorted, window));
    }

    #[test]
    fn hpd_is_no_wider_than_equal_tailed(draws in draws_strategy(), coverage in 0.01f64..0.99) {
        let n = draws.len();
        // The interpolated equal-tailed span covers coverage * (n - 1) order-statistic
        // gaps; the comparison is only meaningful when that reaches the HPD window.
        prop_assume!(coverage * (n as f64 - 1.0) + 1e-9 >= (hpd_window(coverage, n) - 1) as f64);
        let et = equal_tailed(&draws, coverage).unwrap();
        let hd = hpd(&draws, coverage).unwrap();
        prop_assert!(hd.width() <= et.width() + 1e-9);
    }

    #[test]
    fn lower_coverage_never_widens_intervals(draws in draws_strategy(), a in 0.01f64..0.99, b in 0.01f64..0.99) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(equal_tailed(&draws, small).unwrap().width() <= equal_tailed(&draws, large).unwrap().width() + 1e-9);
        prop_assert!(hpd(&draws, small).unwrap().width() <= hpd(&draws, large).unwrap().width());
    }
}

#[test]
fn one_to_ten_at_eighty_percent() {
    let draws: Vec<f64> = (1..=10).map(f64::from).collect();
    let et = equal_tailed(&draws, 0.8).unwrap();
    assert!((et.lower - 1.9).abs() < 1e-12);
    assert!((et.upper - 9.1).abs() < 1e-12);

    let hd = hpd(&draws, 0.8).unwrap();
    assert_eq!(hpd_window(0.8, draws.len()), 8);
    assert_eq!((hd.lower, hd.upper), (1.0, 8.0));
    assert_eq!(hd.width(), 7.0);
}
