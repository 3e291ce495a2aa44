#![deny(missing_docs)]
#![doc = "Driver for posterior summaries: analysis files, report output and logging setup."]

/// YAML analysis configuration.
pub mod config;
/// Canonical JSON and report hashing.
pub mod hash;
/// Tracing subscriber setup for the CLI.
pub mod logging;
/// Summaries, correlations and predictive checks run from one configuration.
pub mod pipeline;
/// Report types and JSON output.
pub mod report;

pub use config::{AnalysisConfig, CorrelationConfig, PredictiveConfig};
pub use pipeline::{analyze, check_predictive, summarize_correlation};
pub use report::{
    read_report, write_report, AnalysisReport, CorrelationReport, PredictiveReport, REPORT_FILE,
};
