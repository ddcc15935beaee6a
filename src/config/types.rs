// src/config/types.rs
use crate::types::Severity;
use serde::{Deserialize, Serialize};

/// Contents of `leakguard.toml`. Every field has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeakGuardToml {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub fix: FixConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Regex patterns matched against forward-slash paths.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude: Vec::new(),
            min_severity: default_min_severity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixConfig {
    #[serde(default = "default_threshold")]
    pub auto_apply_threshold: f64,
    #[serde(default)]
    pub include_manual_review: bool,
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            auto_apply_threshold: default_threshold(),
            include_manual_review: false,
            max_passes: default_max_passes(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["js", "jsx", "ts", "tsx", "mjs", "cjs"]
        .into_iter()
        .map(String::from)
        .collect()
}
const fn default_min_severity() -> Severity { Severity::Low }
const fn default_threshold() -> f64 { 0.9 }
const fn default_max_passes() -> usize { 32 }

/// Resolved configuration: the TOML file plus compiled exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub scan: ScanConfig,
    pub fix: FixConfig,
    pub exclude_patterns: Vec<regex::Regex>,
}
