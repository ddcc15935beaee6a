// src/reporting/mod.rs
//! Output for the CLI: colored text for people, JSON for tools.

pub mod console;

use crate::error::LeakError;
use crate::types::{Fix, FixResult};
use serde::Serialize;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Wire shape of a fix request outcome: `{ success, fix }` or `{ success, error }`.
#[derive(Debug, Serialize)]
pub struct FixOutcome<'a> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<&'a Fix>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> From<&'a FixResult> for FixOutcome<'a> {
    fn from(result: &'a FixResult) -> Self {
        match result {
            Ok(fix) => Self {
                success: true,
                fix: Some(fix),
                error: None,
            },
            Err(e) => Self::failure(e),
        }
    }
}

impl FixOutcome<'_> {
    #[must_use]
    pub fn failure(error: &LeakError) -> Self {
        Self {
            success: false,
            fix: None,
            error: Some(error.to_string()),
        }
    }
}

/// Pretty JSON for any serializable report.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
