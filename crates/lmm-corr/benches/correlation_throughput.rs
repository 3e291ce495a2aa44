use criterion::{criterion_group, criterion_main, Criterion};
use lmm_corr::correlation_draws;
use nalgebra::DMatrix;

fn sample_factors(count: usize) -> Vec<DMatrix<f64>> {
    (0..count)
        .map(|i| {
            let rho = ((i % 200) as f64 / 100.0) - 0.99;
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, rho, (1.0 - rho * rho).sqrt()])
        })
        .collect()
}

fn bench_correlations(c: &mut Criterion) {
    let factors = sample_factors(4000);

    c.bench_function("correlation_draws_4000", |b| {
        b.iter(|| {
            let _ = correlation_draws(&factors, (1, 0)).unwrap();
        })
    });
}

criterion_group!(benches, bench_correlations);
criterion_main!(benches);
