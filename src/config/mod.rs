// src/config/mod.rs
pub mod types;

pub use self::types::{Config, FixConfig, LeakGuardToml, ScanConfig};
use crate::error::{LeakError, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "leakguard.toml";

/// Directory names never descended into during discovery.
pub const PRUNE_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "target", "coverage", ".next"];

#[must_use]
pub fn should_prune(name: &str) -> bool {
    PRUNE_DIRS.contains(&name)
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `leakguard.toml` from the working directory, falling back to defaults.
    ///
    /// # Errors
    /// Returns `LeakError::Config` if the file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// # Errors
    /// Returns `LeakError::Config` if the file exists but cannot be parsed,
    /// or an exclude pattern is not a valid regex.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Self::from_toml(LeakGuardToml::default());
        }
        let content = fs::read_to_string(path).map_err(|source| LeakError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Self::parse_toml(&content)
    }

    /// # Errors
    /// Returns `LeakError::Config` for malformed TOML or a bad exclude pattern.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let parsed: LeakGuardToml = toml::from_str(content)?;
        Self::from_toml(parsed)
    }

    fn from_toml(parsed: LeakGuardToml) -> Result<Self> {
        let exclude_patterns = parsed
            .scan
            .exclude
            .iter()
            .map(|p| Regex::new(p).map_err(|e| LeakError::Config(format!("exclude pattern `{p}`: {e}"))))
            .collect::<Result<Vec<_>>>()?;
        if !(0.0..=1.0).contains(&parsed.fix.auto_apply_threshold) {
            return Err(LeakError::Config(format!(
                "auto_apply_threshold must be between 0 and 1, got {}",
                parsed.fix.auto_apply_threshold
            )));
        }
        Ok(Self {
            scan: parsed.scan,
            fix: parsed.fix,
            exclude_patterns,
        })
    }

    /// True when `ext` is one of the configured source extensions.
    #[must_use]
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.scan.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.scan.min_severity, Severity::Low);
        assert!((config.fix.auto_apply_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.fix.max_passes, 32);
        assert!(config.accepts_extension("TSX"));
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            "[scan]\nmin_severity = \"high\"\nexclude = [\"legacy/\"]\n[fix]\ninclude_manual_review = true\n",
        )
        .unwrap();
        assert_eq!(config.scan.min_severity, Severity::High);
        assert_eq!(config.exclude_patterns.len(), 1);
        assert!(config.fix.include_manual_review);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert!(matches!(Config::parse_toml("[scan]\nexclude = [\"(\"]"), Err(LeakError::Config(_))));
        assert!(matches!(Config::parse_toml("[fix]\nauto_apply_threshold = 2.0"), Err(LeakError::Config(_))));
        assert!(matches!(Config::parse_toml("[scan"), Err(LeakError::Config(_))));
    }

    #[test]
    fn prune_list() {
        assert!(should_prune("node_modules"));
        assert!(!should_prune("src"));
    }
}
