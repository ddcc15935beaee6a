// src/session.rs
//! Applies several fixes to one file. Each pass rescans the current text, so
//! offsets are never reused across edits.

use crate::config::FixConfig;
use crate::detect::scan_source;
use crate::error::Result;
use crate::fix::generate_fix;
use crate::types::{Finding, Fix, LeakType};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct FixOptions {
    pub threshold: f64,
    pub include_manual_review: bool,
    pub max_passes: usize,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self::from(&FixConfig::default())
    }
}

impl From<&FixConfig> for FixOptions {
    fn from(config: &FixConfig) -> Self {
        Self {
            threshold: config.auto_apply_threshold,
            include_manual_review: config.include_manual_review,
            max_passes: config.max_passes,
        }
    }
}

impl FixOptions {
    #[must_use]
    pub fn accepts(&self, fix: &Fix) -> bool {
        fix.confidence >= self.threshold && (self.include_manual_review || !fix.requires_manual_review)
    }
}

/// A finding that was looked at but not fixed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFinding {
    pub finding: Finding,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSession {
    pub file: String,
    pub source: String,
    pub applied: Vec<Fix>,
    pub skipped: Vec<SkippedFinding>,
    pub passes: usize,
}

impl FixSession {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Repeatedly fixes the first eligible finding and rescans until nothing
/// eligible remains or `max_passes` is reached.
///
/// # Errors
/// Returns a parse error if the text cannot be scanned.
pub fn fix_source(source: &str, file_name: &str, options: &FixOptions) -> Result<FixSession> {
    let mut session = FixSession {
        file: file_name.to_string(),
        source: source.to_string(),
        applied: Vec::new(),
        skipped: Vec::new(),
        passes: 0,
    };
    let mut attempted: HashSet<(LeakType, String)> = HashSet::new();

    while session.passes < options.max_passes {
        session.passes += 1;
        let findings = scan_source(&session.source, file_name)?;
        let Some(fix) = next_fix(&mut session, &mut attempted, findings, options) else {
            break;
        };
        tracing::debug!(id = %fix.id, pass = session.passes, "fix applied");
        session.source.clone_from(&fix.fixed_code);
        session.applied.push(fix);
    }
    Ok(session)
}

fn next_fix(
    session: &mut FixSession,
    attempted: &mut HashSet<(LeakType, String)>,
    findings: Vec<Finding>,
    options: &FixOptions,
) -> Option<Fix> {
    for finding in findings {
        if !attempted.insert((finding.leak_type, finding.code_snippet.clone())) {
            continue;
        }
        let reason = match generate_fix(&session.source, &session.file, &finding) {
            Ok(fix) if options.accepts(&fix) => return Some(fix),
            Ok(fix) if fix.requires_manual_review && !options.include_manual_review => {
                "requires manual review".to_string()
            }
            Ok(fix) => format!(
                "confidence {:.2} is below {:.2}",
                fix.confidence, options.threshold
            ),
            Err(e) => e.to_string(),
        };
        session.skipped.push(SkippedFinding { finding, reason });
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TWO_LEAKS: &str = "function Feed({ url }) {\n  const es = new EventSource(url);\n  const ws = new WebSocket(url);\n  return <ul />;\n}\n";

    #[test]
    fn applies_fixes_one_pass_at_a_time() {
        let session = fix_source(TWO_LEAKS, "Feed.tsx", &FixOptions::default()).unwrap();
        assert_eq!(session.applied.len(), 2);
        assert!(session.source.contains("es.close();"));
        assert!(session.source.contains("ws.close();"));
        assert!(scan_source(&session.source, "Feed.tsx").unwrap().is_empty());
    }

    #[test]
    fn manual_review_fixes_are_held_back() {
        let src = "function Poller() {\n  useEffect(() => {\n    setInterval(poll, 500);\n  }, []);\n  return null;\n}\n";
        let session = fix_source(src, "p.tsx", &FixOptions::default()).unwrap();
        assert!(!session.changed());
        assert_eq!(session.source, src);
        assert!(!session.skipped.is_empty());

        let options = FixOptions {
            threshold: 0.5,
            include_manual_review: true,
            max_passes: 8,
        };
        let session = fix_source(src, "p.tsx", &options).unwrap();
        assert!(session.changed());
        assert!(session.source.contains("clearInterval(interval);"));
    }

    #[test]
    fn pass_limit_is_respected() {
        let options = FixOptions {
            max_passes: 1,
            ..FixOptions::default()
        };
        let session = fix_source(TWO_LEAKS, "Feed.tsx", &options).unwrap();
        assert_eq!(session.applied.len(), 1);
        assert_eq!(session.passes, 1);
    }
}
