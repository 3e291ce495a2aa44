#![deny(missing_docs)]
#![doc = "Correlation and covariance draws implied by Cholesky-factor draws of random-effect groups."]

/// Correlation, correlation-matrix and covariance derivations.
pub mod correlation;
/// Assembling and validating Cholesky factors from a draw store.
pub mod factor;

pub use correlation::{
    correlation, correlation_draws, correlation_matrix, covariance_draws, covariance_matrix,
    derive_correlation, derive_covariance, implied_omega,
};
pub use factor::{check_factor, factors_from_store, scales_from_store};
