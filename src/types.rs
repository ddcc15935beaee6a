// src/types.rs
use crate::error::{LeakError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of a detected resource-lifecycle issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum LeakType {
    MissingEffectCleanup,
    UnregisteredEventListener,
    UnregisteredInterval,
    UnregisteredTimeout,
    UnregisteredSubscription,
    UnclosedStreamConnection,
    UnclosedSocketConnection,
}

impl LeakType {
    pub const ALL: [LeakType; 7] = [
        Self::MissingEffectCleanup,
        Self::UnregisteredEventListener,
        Self::UnregisteredInterval,
        Self::UnregisteredTimeout,
        Self::UnregisteredSubscription,
        Self::UnclosedStreamConnection,
        Self::UnclosedSocketConnection,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingEffectCleanup => "missing-effect-cleanup",
            Self::UnregisteredEventListener => "unregistered-event-listener",
            Self::UnregisteredInterval => "unregistered-interval",
            Self::UnregisteredTimeout => "unregistered-timeout",
            Self::UnregisteredSubscription => "unregistered-subscription",
            Self::UnclosedStreamConnection => "unclosed-stream-connection",
            Self::UnclosedSocketConnection => "unclosed-socket-connection",
        }
    }
}

impl fmt::Display for LeakType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeakType {
    type Err = LeakError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| LeakError::UnsupportedLeakType(s.to_string()))
    }
}

impl TryFrom<String> for LeakType {
    type Error = LeakError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One detected issue. Created by the detector, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakDetectionResult {
    #[serde(rename = "type")]
    pub leak_type: LeakType,
    pub severity: Severity,
    pub file: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in UTF-8 bytes from the start of the line.
    pub column: usize,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<String>,
    pub code_snippet: String,
}

pub type Finding = LeakDetectionResult;

/// A single contiguous substitution against the original source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Transformation {
    #[must_use]
    pub fn new(start: usize, end: usize, replacement: String) -> Self {
        Self { start, end, replacement }
    }

    /// Computes `source[..start] + replacement + source[end..]`.
    ///
    /// # Errors
    /// Returns a pattern mismatch if the span is out of bounds or splits a character.
    pub fn apply(&self, source: &str) -> Result<String> {
        if self.start > self.end {
            return Err(LeakError::mismatch("transformation span is inverted"));
        }
        let (Some(head), Some(tail)) = (source.get(..self.start), source.get(self.end..)) else {
            return Err(LeakError::mismatch(format!(
                "transformation span {}..{} does not fit the source",
                self.start, self.end
            )));
        };
        let mut out = String::with_capacity(head.len() + self.replacement.len() + tail.len());
        out.push_str(head);
        out.push_str(&self.replacement);
        out.push_str(tail);
        Ok(out)
    }
}

/// A generated patch for one finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub id: String,
    #[serde(rename = "type")]
    pub leak_type: LeakType,
    pub file: String,
    pub original_code: String,
    pub fixed_code: String,
    pub description: String,
    pub confidence: f64,
    pub requires_manual_review: bool,
    pub transformation: Transformation,
}

/// Outcome of a fix request: `Ok(fix)` on success, a typed failure otherwise.
pub type FixResult = Result<Fix>;
