//! Structured error types shared across the posterior pipeline crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`PosteriorError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (parameter names, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for posterior post-processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum PosteriorError {
    /// No draws were available, or fewer than an interval window needs.
    #[error("insufficient draws: {0}")]
    InsufficientDraws(ErrorInfo),
    /// Coverage or probability out of range, unknown parameter name or index.
    #[error("invalid parameter: {0}")]
    InvalidParameter(ErrorInfo),
    /// A variance component is exactly zero so a correlation is undefined.
    #[error("degenerate variance: {0}")]
    DegenerateVariance(ErrorInfo),
    /// A predictive check was requested without replicate data sets.
    #[error("empty replicate set: {0}")]
    EmptyReplicateSet(ErrorInfo),
    /// Sequences or data sets whose lengths disagree.
    #[error("shape error: {0}")]
    Shape(ErrorInfo),
    /// Serialization, schema and file errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl PosteriorError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            PosteriorError::InsufficientDraws(info)
            | PosteriorError::InvalidParameter(info)
            | PosteriorError::DegenerateVariance(info)
            | PosteriorError::EmptyReplicateSet(info)
            | PosteriorError::Shape(info)
            | PosteriorError::Serde(info) => info,
        }
    }
}

/// Rejects probabilities outside the open unit interval.
///
/// Used for interval coverages and quantile levels alike; NaN is rejected.
pub fn check_probability(label: &str, value: f64) -> Result<(), PosteriorError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(PosteriorError::InvalidParameter(
            ErrorInfo::new("probability-out-of-range", format!("{label} must lie in (0, 1)"))
                .with_context(label, value.to_string()),
        ))
    }
}

/// Rejects empty or non-finite draw sequences.
pub fn check_draws(name: &str, draws: &[f64]) -> Result<(), PosteriorError> {
    if draws.is_empty() {
        return Err(PosteriorError::InsufficientDraws(
            ErrorInfo::new("no-draws", "draw sequence is empty").with_context("parameter", name),
        ));
    }
    if let Some(position) = draws.iter().position(|value| !value.is_finite()) {
        return Err(PosteriorError::InvalidParameter(
            ErrorInfo::new("non-finite-draw", "draw sequence contains a non-finite value")
                .with_context("parameter", name)
                .with_context("position", position.to_string()),
        ));
    }
    Ok(())
}
