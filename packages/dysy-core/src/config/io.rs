//! Configuration I/O (YAML schema types)
//!
//! Loading and export live in session_config.rs.

use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Field overrides applied on top of the preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Per-field overrides; absent fields keep the preset value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_when_exhausted: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps_per_call: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_call_depth: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub solver_timeout_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_range: Option<[i64; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_range: Option<[f64; 2]>,
}
