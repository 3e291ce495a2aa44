//! Convergence diagnostics computed across chains.
//!
//! Both diagnostics work on per-chain draw sequences. Chains of unequal
//! length are truncated to the shortest one.

use crate::point::mean;

/// Minimum draws per chain for split R-hat.
pub const MIN_RHAT_DRAWS: usize = 4;
/// Minimum draws per chain for the effective sample size.
pub const MIN_ESS_DRAWS: usize = 10;
/// Largest autocorrelation lag considered by the ESS estimate.
pub const MAX_ESS_LAG: usize = 100;

fn common_length(chains: &[Vec<f64>]) -> usize {
    chains.iter().map(Vec::len).min().unwrap_or(0)
}

fn sample_variance(values: &[f64]) -> f64 {
    let centre = mean(values);
    values.iter().map(|x| (x - centre).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Split R-hat (Gelman-Rubin on half-chains).
///
/// Each chain is cut into its first and second half, giving `2M` sequences
/// of length `n`. With within-sequence variance `W` and between-sequence
/// variance `B`, `var+ = ((n - 1) W + B) / n` and `R = sqrt(var+ / W)`.
/// Returns `None` with fewer than [`MIN_RHAT_DRAWS`] draws per chain or when
/// every sequence is constant.
pub fn split_rhat(chains: &[Vec<f64>]) -> Option<f64> {
    let length = common_length(chains);
    if chains.is_empty() || length < MIN_RHAT_DRAWS {
        return None;
    }
    let half = length / 2;
    let mut halves: Vec<&[f64]> = Vec::with_capacity(chains.len() * 2);
    for chain in chains {
        halves.push(&chain[..half]);
        halves.push(&chain[half..2 * half]);
    }

    let means: Vec<f64> = halves.iter().map(|seq| mean(seq)).collect();
    let within = halves.iter().map(|seq| sample_variance(seq)).sum::<f64>() / halves.len() as f64;
    if within <= 0.0 {
        return None;
    }
    let grand = mean(&means);
    let between = half as f64 * means.iter().map(|m| (m - grand).powi(2)).sum::<f64>()
        / (halves.len() - 1) as f64;
    let var_plus = ((half - 1) as f64 * within + between) / half as f64;
    Some((var_plus / within).sqrt())
}

/// Autocorrelation of a sequence at lags `1..=max_lag`.
pub fn autocorrelation(chain: &[f64], max_lag: usize) -> Vec<f64> {
    let n = chain.len();
    let centre = mean(chain);
    let variance = chain.iter().map(|x| (x - centre).powi(2)).sum::<f64>() / n as f64;
    (1..=max_lag)
        .map(|lag| {
            if lag >= n || variance <= 0.0 {
                return 0.0;
            }
            let cov = (0..n - lag)
                .map(|i| (chain[i] - centre) * (chain[i + lag] - centre))
                .sum::<f64>()
                / n as f64;
            cov / variance
        })
        .collect()
}

/// Effective sample size pooled over chains.
///
/// Averages the per-chain autocorrelation up to `min(n / 2, 100)` lags, sums
/// the leading positive values and returns `N / (1 + 2 Σρ)` with `N` the
/// total draw count. Returns `None` with fewer than [`MIN_ESS_DRAWS`] draws
/// per chain.
pub fn effective_sample_size(chains: &[Vec<f64>]) -> Option<f64> {
    let length = common_length(chains);
    if chains.is_empty() || length < MIN_ESS_DRAWS {
        return None;
    }
    let max_lag = (length / 2).min(MAX_ESS_LAG);
    let mut averaged = vec![0.0; max_lag];
    for chain in chains {
        for (slot, rho) in averaged
            .iter_mut()
            .zip(autocorrelation(&chain[..length], max_lag))
        {
            *slot += rho / chains.len() as f64;
        }
    }
    let positive_sum: f64 = averaged.iter().take_while(|&&rho| rho > 0.0).sum();
    let total = (length * chains.len()) as f64;
    Some(total / (1.0 + 2.0 * positive_sum))
}

/// Monte Carlo standard error of the mean.
pub fn mcse_mean(sd: f64, ess: f64) -> Option<f64> {
    (ess > 0.0).then(|| sd / ess.sqrt())
}
