// src/batch.rs
//! Batch scan utility: reads and scans many files, one failure never aborts the batch.

use crate::detect::scan_source;
use crate::error::{LeakError, Result};
use crate::types::{Finding, Severity};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A file that could not be read or parsed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Aggregated results from scanning multiple files.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub findings: Vec<Finding>,
    pub failures: Vec<FileFailure>,
    pub files_scanned: usize,
    pub duration_ms: u128,
}

impl BatchReport {
    #[must_use]
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Drops findings below `min`.
    pub fn retain_min_severity(&mut self, min: Severity) {
        self.findings.retain(|f| f.severity >= min);
    }

    #[must_use]
    pub fn count_at(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}

/// Scans `paths` in parallel. Findings are concatenated in input order.
#[must_use]
pub fn scan_files(paths: &[PathBuf]) -> BatchReport {
    let start = Instant::now();

    let results: Vec<(PathBuf, Result<Vec<Finding>>)> = paths
        .par_iter()
        .map(|path| (path.clone(), scan_file(path)))
        .collect();

    let mut report = BatchReport {
        files_scanned: paths.len(),
        ..BatchReport::default()
    };
    for (path, result) in results {
        match result {
            Ok(findings) => report.findings.extend(findings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                report.failures.push(FileFailure {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }
    report.duration_ms = start.elapsed().as_millis();
    report
}

/// Reads and scans one file, naming the findings after its path.
///
/// # Errors
/// Returns `LeakError::Io` if the file cannot be read, or a parse error.
pub fn scan_file(path: &Path) -> Result<Vec<Finding>> {
    let source = std::fs::read_to_string(path).map_err(|source| LeakError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    scan_source(&source, &path.to_string_lossy())
}
