//! Core data models for tree synchronization

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Counters accumulated over one merge run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeStats {
    /// Estimated characters sent to and received from the provider
    pub characters: usize,
    /// Leaves filled with a fresh translation
    pub translated: usize,
    /// Leaves kept because the target already had a non-empty value
    pub preserved: usize,
    /// Leaves where the provider failed and the source text was kept
    pub failed: usize,
    /// Non-string scalars copied verbatim from the source
    pub copied: usize,
}

/// Result of one merge run: the completed tree plus its usage counters
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The completed target-language tree
    pub tree: Value,
    /// Usage counters for the run
    pub stats: MergeStats,
}
