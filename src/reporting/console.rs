// src/reporting/console.rs
use crate::batch::BatchReport;
use crate::session::FixSession;
use crate::types::{Finding, Fix, Severity};
use colored::Colorize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Prints findings grouped by file, then a summary line.
pub fn print_report(report: &BatchReport) {
    let mut by_file: BTreeMap<&str, Vec<&Finding>> = BTreeMap::new();
    for finding in &report.findings {
        by_file.entry(finding.file.as_str()).or_default().push(finding);
    }
    for (file, findings) in &by_file {
        println!("{}", file.bold());
        for finding in findings {
            print_finding(finding);
        }
        println!();
    }
    for failure in &report.failures {
        println!(
            "{} {}: {}",
            "skipped".yellow(),
            failure.path.display(),
            failure.error.dimmed()
        );
    }
    print_summary(report);
}

fn print_finding(finding: &Finding) {
    let header = format!("{}: {}", severity_tag(finding.severity), finding.description);
    println!("  {header}");
    println!(
        "    {} {}:{}:{} {}",
        "-->".blue(),
        finding.file,
        finding.line,
        finding.column,
        finding.leak_type.to_string().dimmed()
    );
    if let Some(first) = finding.code_snippet.lines().next() {
        println!("    {} {}", "|".blue(), first);
    }
    if let Some(ref suggestion) = finding.suggested_fix {
        println!("    {} {} {}", "=".blue(), "FIX:".green(), suggestion);
    }
}

fn severity_tag(severity: Severity) -> String {
    let label = severity.label().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::High => label.red().to_string(),
        Severity::Medium => label.yellow().to_string(),
        Severity::Low => label.dimmed().to_string(),
    }
}

fn print_summary(report: &BatchReport) {
    let duration = Duration::from_millis(u64::try_from(report.duration_ms).unwrap_or(u64::MAX));
    let files = report.files_scanned;
    if report.findings.is_empty() {
        println!(
            "{} No leaks found in {files} {} ({duration:?}).",
            "OK".green().bold(),
            pluralize("file", files)
        );
        return;
    }

    let parts: Vec<String> = [Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
        .into_iter()
        .filter_map(|s| {
            let n = report.count_at(s);
            (n > 0).then(|| format!("{n} {}", s.label()))
        })
        .collect();
    let total = report.findings.len();
    println!(
        "{} {total} {} in {files} {} ({}) ({duration:?}).",
        "X".red().bold(),
        pluralize("leak", total),
        pluralize("file", files),
        parts.join(", ")
    );
}

/// Prints one fix with its patched region.
pub fn print_fix(fix: &Fix) {
    let review = if fix.requires_manual_review {
        "manual review".yellow().to_string()
    } else {
        "auto-applicable".green().to_string()
    };
    println!(
        "{} {} ({}, confidence {:.2}, {review})",
        fix.id.bold(),
        fix.description,
        fix.leak_type,
        fix.confidence
    );
    println!("  {} {} bytes {}..{}", "-->".blue(), fix.file, fix.transformation.start, fix.transformation.end);
    for line in fix.transformation.replacement.lines() {
        println!("  {} {}", "+".green(), line);
    }
}

pub fn print_session(session: &FixSession, written: bool) {
    for fix in &session.applied {
        print_fix(fix);
    }
    for skipped in &session.skipped {
        println!(
            "  {} {}:{} {}: {}",
            "skipped".yellow(),
            skipped.finding.line,
            skipped.finding.column,
            skipped.finding.leak_type,
            skipped.reason.dimmed()
        );
    }
    let n = session.applied.len();
    let verb = if written { "applied to" } else { "available for" };
    println!(
        "{} {n} {} {verb} {}",
        if n > 0 { "~".yellow().bold() } else { "OK".green().bold() },
        pluralize("fix", n),
        session.file
    );
}

pub fn print_error(message: &str) {
    eprintln!("{} {message}", "error:".red().bold());
}

fn pluralize(word: &str, count: usize) -> String {
    match (count, word.ends_with('x')) {
        (1, _) => word.to_string(),
        (_, true) => format!("{word}es"),
        _ => format!("{word}s"),
    }
}
