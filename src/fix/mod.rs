// src/fix/mod.rs
//! Fix dispatcher: maps a finding's type to its generator and turns the
//! generator's plan into a [`Fix`].

mod connection;
pub mod edit;
mod effect;
mod listener;
pub mod pattern;
mod timer;

pub use connection::{ConnectionPattern, ConnectionRules};
pub use listener::{EventListenerPattern, ListenerRules};
pub use pattern::{Planned, ReleaseRules, ResourceFamily};
pub use timer::{TimerPattern, TimerRules};

use crate::error::{LeakError, Result};
use crate::syntax::{self_and_ancestors, SyntaxIndex};
use crate::types::{Finding, Fix, FixResult, LeakType};
use sha2::{Digest, Sha256};
use tree_sitter::Node;

type Generator = fn(&SyntaxIndex<'_>, &Finding) -> Result<Planned>;

const GENERATORS: &[(LeakType, Generator)] = &[
    (LeakType::MissingEffectCleanup, effect::generate),
    (LeakType::UnregisteredEventListener, listener::generate),
    (LeakType::UnregisteredInterval, timer::generate),
    (LeakType::UnregisteredTimeout, timer::generate),
    (LeakType::UnregisteredSubscription, connection::generate),
    (LeakType::UnclosedStreamConnection, connection::generate),
    (LeakType::UnclosedSocketConnection, connection::generate),
];

fn generator_for(leak_type: LeakType) -> Result<Generator> {
    GENERATORS
        .iter()
        .find(|(t, _)| *t == leak_type)
        .map(|(_, generator)| *generator)
        .ok_or_else(|| LeakError::UnsupportedLeakType(leak_type.to_string()))
}

/// Generates a fix for one finding against the text it was found in.
///
/// Success is only returned once the transformation has been computed and
/// applied; every failure comes back as a typed error.
///
/// # Errors
/// Position misses, pattern mismatches, missing context and parse failures.
pub fn generate_fix(source: &str, file_name: &str, finding: &Finding) -> FixResult {
    let generator = generator_for(finding.leak_type)?;
    let index = SyntaxIndex::parse(source, file_name)?;
    let planned = generator(&index, finding)?;
    let fixed_code = planned.transformation.apply(source)?;

    let fix = Fix {
        id: fix_id(file_name, finding, &fixed_code),
        leak_type: finding.leak_type,
        file: file_name.to_string(),
        original_code: source.to_string(),
        fixed_code,
        description: planned.description,
        confidence: planned.confidence,
        requires_manual_review: planned.requires_manual_review,
        transformation: planned.transformation,
    };
    tracing::debug!(
        id = %fix.id,
        leak_type = %fix.leak_type,
        start = fix.transformation.start,
        end = fix.transformation.end,
        confidence = fix.confidence,
        "fix generated"
    );
    Ok(fix)
}

/// Same as [`generate_fix`] with the leak type given by name, as the CLI receives it.
///
/// # Errors
/// `UnsupportedLeakType` for an unknown name, otherwise as [`generate_fix`].
pub fn generate_fix_at(
    source: &str,
    file_name: &str,
    leak_type: &str,
    line: usize,
    column: usize,
) -> FixResult {
    let leak_type: LeakType = leak_type.parse()?;
    let index = SyntaxIndex::parse(source, file_name)?;
    let snippet = index
        .node_at_position(line, column)
        .map(|n| index.text_of(n).to_string())
        .unwrap_or_default();
    let finding = Finding {
        leak_type,
        severity: crate::types::Severity::Medium,
        file: file_name.to_string(),
        line,
        column,
        description: String::new(),
        suggested_fix: None,
        code_snippet: snippet,
    };
    generate_fix(source, file_name, &finding)
}

/// Node at the finding's position, widened to the first ancestor matching `shape`.
fn locate<'t>(
    index: &'t SyntaxIndex<'_>,
    finding: &Finding,
    construct: &'static str,
    shape: impl Fn(Node<'t>) -> bool,
) -> Result<Node<'t>> {
    let miss = || LeakError::PositionMiss {
        construct,
        line: finding.line,
        column: finding.column,
    };
    let node = index
        .node_at_position(finding.line, finding.column)
        .ok_or_else(miss)?;
    self_and_ancestors(node).find(|n| shape(*n)).ok_or_else(miss)
}

fn fix_id(file_name: &str, finding: &Finding, fixed_code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_name.as_bytes());
    hasher.update(finding.leak_type.as_str().as_bytes());
    hasher.update(format!("{}:{}", finding.line, finding.column).as_bytes());
    hasher.update(fixed_code.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("fix-{}", digest.chars().take(12).collect::<String>())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn every_leak_type_has_a_generator() {
        for t in LeakType::ALL {
            assert!(generator_for(t).is_ok(), "{t}");
        }
    }

    #[test]
    fn unknown_type_name_is_unsupported() {
        let err = generate_fix_at("const a = 1;", "a.ts", "unclosed-file", 1, 1).unwrap_err();
        assert!(matches!(err, LeakError::UnsupportedLeakType(ref t) if t == "unclosed-file"));
    }

    #[test]
    fn position_past_the_end_is_a_miss() {
        let src = "function A() {\n  setInterval(f, 1);\n}\n";
        let err = generate_fix_at(src, "a.tsx", "unregistered-interval", 40, 1).unwrap_err();
        assert!(err.is_position_miss());
        assert!(err.to_string().starts_with("could not find timer call"));
    }

    #[test]
    fn fix_is_sound_and_carries_metadata() {
        let src = "function A() {\n  useEffect(() => {\n    const id = setInterval(f, 1);\n  }, []);\n  return null;\n}\n";
        let fix = generate_fix_at(src, "a.tsx", "unregistered-interval", 3, 16).unwrap();
        let t = &fix.transformation;
        let spliced = format!("{}{}{}", &src[..t.start], t.replacement, &src[t.end..]);
        assert_eq!(fix.fixed_code, spliced);
        assert_eq!(fix.original_code, src);
        assert!(fix.id.starts_with("fix-") && fix.id.len() == 16);
        assert!(fix.fixed_code.contains("clearInterval(id);"));
    }
}
