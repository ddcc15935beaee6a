// src/cli/args.rs
use crate::reporting::OutputFormat;
use crate::types::Severity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "leakguard", version, about = "Resource-leak detector and fixer for UI components")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Debug logging on stderr (`RUST_LOG` overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report leaks in files or directories
    Scan {
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Overrides `[scan] min_severity`
        #[arg(long, value_enum)]
        min_severity: Option<Severity>,
    },
    /// Generate the fix for one finding
    Fix {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        line: usize,
        #[arg(long)]
        column: usize,
        /// Leak type, e.g. `unregistered-interval`
        #[arg(long = "type", value_name = "TYPE")]
        leak_type: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write the patched file back
        #[arg(long)]
        write: bool,
    },
    /// Apply every eligible fix, one rescan per fix
    FixAll {
        #[arg(value_name = "PATH", default_value = ".")]
        paths: Vec<PathBuf>,
        #[arg(long)]
        write: bool,
        /// Overrides `[fix] auto_apply_threshold`
        #[arg(long)]
        threshold: Option<f64>,
        /// Also apply fixes flagged for manual review
        #[arg(long)]
        include_manual: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Arguments for the fix command (used by handlers)
#[derive(Debug, Clone)]
pub struct FixArgs {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub leak_type: String,
    pub format: OutputFormat,
    pub write: bool,
}

/// Arguments for the fix-all command (used by handlers)
#[derive(Debug, Clone)]
pub struct FixAllArgs {
    pub paths: Vec<PathBuf>,
    pub write: bool,
    pub threshold: Option<f64>,
    pub include_manual: bool,
    pub format: OutputFormat,
}
