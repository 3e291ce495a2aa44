use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lmm_core::{AnalysisProvenance, DrawStore, ErrorInfo, PosteriorError, SchemaVersion};
use lmm_ppc::PredictiveCheck;
use lmm_summary::ParameterSummary;
use serde::{Deserialize, Serialize};

use crate::hash::stable_hash_string;

/// File name of the report inside the output directory.
pub const REPORT_FILE: &str = "report.json";

/// Summary of one derived correlation and, when scales were given, its covariance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    /// Derived parameter name.
    pub name: String,
    /// Factor parameter the draws came from.
    pub factor: String,
    /// 1-based pair as configured.
    pub pair: [usize; 2],
    /// Summary of the correlation draws.
    pub correlation: ParameterSummary,
    /// Summary of the covariance draws.
    pub covariance: Option<ParameterSummary>,
}

/// Outcome of a posterior-predictive check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveReport {
    /// Vector parameter holding the replicates.
    pub replicates: String,
    /// Observed-data column.
    pub column: String,
    /// Statistic values and p-value.
    pub check: PredictiveCheck,
    /// Replicate positions chosen for overlay output, in sample order.
    pub subset: Vec<usize>,
}

/// Everything one analysis produced, plus a content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema of this payload.
    pub schema: SchemaVersion,
    /// Where the draws came from and how they were processed.
    pub provenance: AnalysisProvenance,
    /// Summary table rows in draw-file order.
    pub summaries: Vec<ParameterSummary>,
    /// Derived correlation summaries in configuration order.
    pub correlations: Vec<CorrelationReport>,
    /// Predictive check, when configured.
    pub predictive: Option<PredictiveReport>,
    /// SHA-256 over every other field.
    pub report_hash: String,
}

impl AnalysisReport {
    /// Assembles a report and fills in its hash.
    pub fn new(
        provenance: AnalysisProvenance,
        summaries: Vec<ParameterSummary>,
        correlations: Vec<CorrelationReport>,
        predictive: Option<PredictiveReport>,
    ) -> Result<Self, PosteriorError> {
        let mut report = Self {
            schema: SchemaVersion::default(),
            provenance,
            summaries,
            correlations,
            predictive,
            report_hash: String::new(),
        };
        report.report_hash = report.compute_hash()?;
        Ok(report)
    }

    /// Recomputes the hash from the report body.
    pub fn compute_hash(&self) -> Result<String, PosteriorError> {
        stable_hash_string(&(
            &self.schema,
            &self.provenance,
            &self.summaries,
            &self.correlations,
            &self.predictive,
        ))
    }
}

/// Provenance for an analysis of `store` loaded from `sources`.
pub fn make_provenance(store: &DrawStore, sources: &[String], seed: u64) -> AnalysisProvenance {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    AnalysisProvenance {
        draw_sources: sources.to_vec(),
        draw_count: store.draw_count(),
        chain_count: store.chain_count(),
        seed,
        tool_versions,
    }
}

/// Writes `report` as pretty JSON into `out_dir`, returning the file path.
pub fn write_report(out_dir: &Path, report: &AnalysisReport) -> Result<PathBuf, PosteriorError> {
    let write_error = |err: std::io::Error| {
        PosteriorError::Serde(
            ErrorInfo::new("report-write", err.to_string())
                .with_context("path", out_dir.display().to_string()),
        )
    };
    fs::create_dir_all(out_dir).map_err(write_error)?;
    let json = serde_json::to_string_pretty(report).map_err(|err| {
        PosteriorError::Serde(ErrorInfo::new("json-serialize", err.to_string()))
    })?;
    let path = out_dir.join(REPORT_FILE);
    fs::write(&path, json).map_err(write_error)?;
    Ok(path)
}

/// Reads a report written by [`write_report`].
pub fn read_report(path: &Path) -> Result<AnalysisReport, PosteriorError> {
    let bytes = fs::read(path).map_err(|err| {
        PosteriorError::Serde(
            ErrorInfo::new("report-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|err| PosteriorError::Serde(ErrorInfo::new("json-deserialize", err.to_string())))
}
