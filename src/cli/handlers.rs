// src/cli/handlers.rs
use crate::batch;
use crate::cli::args::{FixAllArgs, FixArgs};
use crate::config::Config;
use crate::discovery;
use crate::error::LeakError;
use crate::exit::LeakGuardExit;
use crate::fix::generate_fix_at;
use crate::reporting::{self, console, FixOutcome, OutputFormat};
use crate::session::{fix_source, FixOptions, FixSession};
use crate::types::Severity;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn load_config() -> Result<Config> {
    Config::load().context("failed to load leakguard.toml")
}

/// Handles the scan command.
///
/// # Errors
/// Returns error if configuration or discovery fails.
pub fn handle_scan(
    paths: &[PathBuf],
    format: OutputFormat,
    min_severity: Option<Severity>,
) -> Result<LeakGuardExit> {
    let config = load_config()?;
    let files = discovery::discover(paths, &config)?;
    let mut report = batch::scan_files(&files);
    report.retain_min_severity(min_severity.unwrap_or(config.scan.min_severity));

    match format {
        OutputFormat::Json => println!("{}", reporting::to_json(&report)?),
        OutputFormat::Text => console::print_report(&report),
    }

    if report.has_findings() {
        Ok(LeakGuardExit::FindingsPresent)
    } else {
        Ok(LeakGuardExit::Success)
    }
}

/// Handles the fix command.
///
/// # Errors
/// Returns error if the file cannot be read or written.
pub fn handle_fix(args: &FixArgs) -> Result<LeakGuardExit> {
    let source = read_source(&args.file)?;
    let file_name = args.file.to_string_lossy();
    let result = generate_fix_at(&source, &file_name, &args.leak_type, args.line, args.column);

    match args.format {
        OutputFormat::Json => println!("{}", reporting::to_json(&FixOutcome::from(&result))?),
        OutputFormat::Text => match &result {
            Ok(fix) => console::print_fix(fix),
            Err(e) => console::print_error(&e.to_string()),
        },
    }

    match result {
        Ok(fix) => {
            if args.write {
                write_source(&args.file, &fix.fixed_code)?;
            }
            Ok(LeakGuardExit::Success)
        }
        Err(e) => Ok(exit_for(&e)),
    }
}

fn exit_for(error: &LeakError) -> LeakGuardExit {
    match error {
        LeakError::PositionMiss { .. } | LeakError::UnsupportedLeakType(_) => {
            LeakGuardExit::InvalidInput
        }
        LeakError::PatternMismatch(_) | LeakError::MissingContext => LeakGuardExit::FixFailure,
        LeakError::Parse { .. } | LeakError::Io { .. } | LeakError::Config(_) => {
            LeakGuardExit::Error
        }
    }
}

/// Handles the fix-all command.
///
/// # Errors
/// Returns error if configuration, discovery or writing fails.
pub fn handle_fix_all(args: &FixAllArgs) -> Result<LeakGuardExit> {
    let config = load_config()?;
    let mut options = FixOptions::from(&config.fix);
    if let Some(threshold) = args.threshold {
        options.threshold = threshold;
    }
    options.include_manual_review |= args.include_manual;

    let files = discovery::discover(&args.paths, &config)?;
    let results: Vec<(PathBuf, Result<FixSession>)> = files
        .par_iter()
        .map(|path| (path.clone(), fix_file(path, &options)))
        .collect();

    let mut sessions = Vec::new();
    let mut failed = false;
    for (path, result) in results {
        match result {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                console::print_error(&format!("{}: {e:#}", path.display()));
                failed = true;
            }
        }
    }

    if args.write {
        for session in sessions.iter().filter(|s| s.changed()) {
            write_source(Path::new(&session.file), &session.source)?;
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", reporting::to_json(&sessions)?),
        OutputFormat::Text => {
            for session in &sessions {
                console::print_session(session, args.write);
            }
        }
    }

    let remaining = sessions.iter().any(|s| !s.skipped.is_empty());
    Ok(match (failed, remaining) {
        (true, _) => LeakGuardExit::Error,
        (false, true) => LeakGuardExit::FindingsPresent,
        (false, false) => LeakGuardExit::Success,
    })
}

fn fix_file(path: &Path, options: &FixOptions) -> Result<FixSession> {
    let source = read_source(path)?;
    let session = fix_source(&source, &path.to_string_lossy(), options)?;
    Ok(session)
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn write_source(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
