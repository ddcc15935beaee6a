// src/cli/dispatch.rs
//! Command dispatch logic extracted from the binary.

use super::args::{Commands, FixAllArgs, FixArgs};
use super::handlers::{handle_fix, handle_fix_all, handle_scan};
use crate::exit::LeakGuardExit;
use anyhow::Result;

/// Executes the parsed command.
///
/// # Errors
/// Returns error if the command handler fails.
pub fn execute(command: Commands) -> Result<LeakGuardExit> {
    match command {
        Commands::Scan {
            paths,
            format,
            min_severity,
        } => handle_scan(&paths, format, min_severity),
        Commands::Fix {
            file,
            line,
            column,
            leak_type,
            format,
            write,
        } => handle_fix(&FixArgs {
            file,
            line,
            column,
            leak_type,
            format,
            write,
        }),
        Commands::FixAll {
            paths,
            write,
            threshold,
            include_manual,
            format,
        } => handle_fix_all(&FixAllArgs {
            paths,
            write,
            threshold,
            include_manual,
            format,
        }),
    }
}
