//! Provenance and schema descriptors attached to analysis reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Semantic version describing the schema of serialized payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version incremented for breaking changes.
    pub major: u32,
    /// Minor version incremented for additive changes.
    pub minor: u32,
    /// Patch version incremented for bug fixes and documentation updates.
    pub patch: u32,
}

impl SchemaVersion {
    /// Creates a new schema version descriptor.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// Provenance information attached to every serialized report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnalysisProvenance {
    /// Draw files the report was computed from, in load order.
    pub draw_sources: Vec<String>,
    /// Number of draws per parameter after all chains were merged.
    pub draw_count: usize,
    /// Number of chains found in the draw files.
    pub chain_count: usize,
    /// Seed used for any randomised step (replicate subsets).
    pub seed: u64,
    /// Version map for the tools involved in the analysis.
    pub tool_versions: BTreeMap<String, String>,
}
