// src/fix/pattern.rs
//! The decision tree shared by the timer, event-registration and
//! connection/subscription generators.
//!
//! A generator supplies family-specific text through [`ReleaseRules`]; the
//! placement (declaration, cleanup insertion, effect wrapper, deferred note)
//! and the confidence model live here.

use super::edit::{
    block, cleanup_return, effect_api, effect_wrapper, indent_lines, insert_before_brace,
    relative, single_line, slice, unique_name, EditSet,
};
use crate::context::{enclosing_statement, standalone_statement, ContextAnalyzer, EffectBlock};
use crate::error::{LeakError, Result};
use crate::syntax::{
    enclosing_function, in_malformed_region, line_indent, span, unwrap_expression, SyntaxIndex,
};
use crate::types::Transformation;
use std::collections::HashSet;
use std::ops::Range;
use tree_sitter::Node;

/// Resource families with their own release shape and confidence profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFamily {
    Interval,
    Timeout,
    EventListener,
    Stream,
    Socket,
    Subscription,
}

impl ResourceFamily {
    #[must_use]
    pub fn base_confidence(self) -> f64 {
        match self {
            Self::Interval | Self::Timeout | Self::EventListener => 0.95,
            Self::Stream | Self::Socket => 0.90,
            Self::Subscription => 0.85,
        }
    }

    #[must_use]
    pub fn confidence_floor(self) -> f64 {
        match self {
            Self::Interval | Self::Timeout | Self::EventListener => 0.6,
            Self::Stream | Self::Socket | Self::Subscription => 0.5,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Timeout => "timeout",
            Self::EventListener => "event listener",
            Self::Stream => "stream connection",
            Self::Socket => "socket connection",
            Self::Subscription => "subscription",
        }
    }
}

/// Family-specific text for one construct. All returned fragments are relative
/// (see [`super::edit::indent_lines`]).
pub trait ReleaseRules {
    fn family(&self) -> ResourceFamily;

    /// Preferred name for a synthesized binding.
    fn name_hint(&self) -> String;

    /// Statement(s) that bind the construct to `name`, replacing its own statement.
    fn declaration(&self, name: &str) -> String;

    /// The release statement for a construct bound to `name`.
    fn release(&self, name: &str) -> String;
}

/// Where a cleanup can be added inside an effect block.
#[derive(Debug, Clone)]
pub struct EffectAnchor {
    /// Span of the effect callback's body.
    pub body: Range<usize>,
    pub body_is_block: bool,
    /// Indentation of the line holding the effect call.
    pub indent: String,
    pub cleanup: Option<CleanupAnchor>,
}

/// Body of the cleanup callback an effect already returns.
#[derive(Debug, Clone)]
pub struct CleanupAnchor {
    pub body: Range<usize>,
    pub is_block: bool,
}

impl EffectAnchor {
    /// # Errors
    /// Returns a pattern mismatch if the callback has no body or the effect
    /// call contains a syntax error.
    pub fn of(source: &str, analyzer: &ContextAnalyzer<'_>, effect: EffectBlock<'_>) -> Result<Self> {
        if in_malformed_region(effect.call) {
            return Err(LeakError::mismatch("effect block contains a syntax error"));
        }
        let body = effect
            .callback
            .child_by_field_name("body")
            .ok_or_else(|| LeakError::mismatch("effect callback has no body"))?;
        let cleanup = analyzer
            .cleanup_callback(effect.callback)
            .and_then(|func| func.child_by_field_name("body"))
            .map(|b| CleanupAnchor {
                body: span(b),
                is_block: b.kind() == "statement_block",
            });
        Ok(Self {
            body: span(body),
            body_is_block: body.kind() == "statement_block",
            indent: line_indent(source, effect.call.start_byte()).to_string(),
            cleanup,
        })
    }
}

/// Everything the decision tree needs to know about where a construct lives.
#[derive(Debug, Clone)]
pub struct PatternContext {
    pub bound_name: Option<String>,
    pub in_component: bool,
    /// The construct sits in a function nested inside the effect callback.
    pub nested_scope: bool,
    /// The construct is the whole expression body of the effect callback.
    pub construct_is_body: bool,
    /// Statement rewritten in place: the binding statement for declared
    /// constructs, the construct's own expression statement otherwise.
    pub statement: Option<Range<usize>>,
    /// Nearest statement holding the construct.
    pub anchor: Option<Range<usize>>,
    pub effect: Option<EffectAnchor>,
}

impl PatternContext {
    /// # Errors
    /// Fails with a pattern mismatch when a syntax error sits in or around the
    /// construct's outermost function, and with missing context when it has
    /// no enclosing function.
    pub fn analyze(index: &SyntaxIndex<'_>, construct: Node, bound_name: Option<String>) -> Result<Self> {
        if in_malformed_region(construct) {
            return Err(LeakError::mismatch("construct is in a region with a syntax error"));
        }
        let source = index.source();
        let analyzer = ContextAnalyzer::new(source);
        let func = enclosing_function(construct).ok_or(LeakError::MissingContext)?;

        let anchor = enclosing_statement(construct);
        let statement = if analyzer.extract_bound_name(construct).is_some() {
            anchor
        } else {
            standalone_statement(construct)
        };

        let (effect, nested_scope, construct_is_body) = match analyzer.effect_block_of(construct) {
            Some(block) => {
                let body = block.callback.child_by_field_name("body");
                let is_body = body.map(unwrap_expression) == Some(construct);
                let anchor = EffectAnchor::of(source, &analyzer, block)?;
                (Some(anchor), func != block.callback, is_body)
            }
            None => (None, false, false),
        };

        Ok(Self {
            bound_name,
            in_component: analyzer.is_component_function(func),
            nested_scope,
            construct_is_body,
            statement: statement.map(span),
            anchor: anchor.map(span),
            effect,
        })
    }

    fn rewrite_target(&self) -> Result<Range<usize>> {
        self.statement
            .clone()
            .ok_or_else(|| LeakError::mismatch("construct is not a statement of its own"))
    }
}

/// A computed edit plus its review metadata, before it is turned into a `Fix`.
#[derive(Debug, Clone)]
pub struct Planned {
    pub transformation: Transformation,
    pub confidence: f64,
    pub requires_manual_review: bool,
    pub description: String,
}

pub struct Pattern<R> {
    pub rules: R,
    pub context: PatternContext,
}

impl<R: ReleaseRules> Pattern<R> {
    #[must_use]
    pub fn new(rules: R, context: PatternContext) -> Self {
        Self { rules, context }
    }

    /// Runs the decision tree and scores the result.
    ///
    /// # Errors
    /// Returns a pattern mismatch when the construct cannot be rewritten in place.
    pub fn plan(&self, source: &str) -> Result<Planned> {
        let cx = &self.context;
        let family = self.rules.family();
        let label = family.label();
        let (name, synthesized) = match &cx.bound_name {
            Some(name) => (name.clone(), false),
            None => (unique_name(source, &self.rules.name_hint(), &mut HashSet::new()), true),
        };
        let release = self.rules.release(&name);
        let mut edits = EditSet::new();

        let description = if let Some(effect) = &cx.effect {
            if synthesized && cx.construct_is_body {
                let body = block(&[self.rules.declaration(&name), cleanup_return(&[release])]);
                edits.replace(effect.body.clone(), indent_lines(&body, &effect.indent));
            } else {
                if synthesized {
                    let stmt = cx.rewrite_target()?;
                    let indent = line_indent(source, stmt.start);
                    edits.replace(stmt, indent_lines(&self.rules.declaration(&name), indent));
                }
                add_cleanup(&mut edits, source, effect, &[release])?;
            }
            match (synthesized, effect.cleanup.is_some()) {
                (true, _) => format!("Bound the {label} to `{name}` and released it in the effect cleanup"),
                (false, true) => format!("Released `{name}` in the existing effect cleanup"),
                (false, false) => {
                    format!("Returned a cleanup callback from the effect that releases `{name}`")
                }
            }
        } else if cx.in_component {
            let stmt = cx.rewrite_target()?;
            let indent = line_indent(source, stmt.start);
            let body = if synthesized {
                self.rules.declaration(&name)
            } else {
                relative(slice(source, stmt.clone())?, indent)
            };
            let api = effect_api(source);
            let wrapped = effect_wrapper(api, &body, &[release]);
            edits.replace(stmt, indent_lines(&wrapped, indent));
            format!("Moved the {label} into a new {api} block that releases it on unmount")
        } else {
            let stmt = if synthesized {
                let stmt = cx.rewrite_target()?;
                let indent = line_indent(source, stmt.start);
                edits.replace(stmt.clone(), indent_lines(&self.rules.declaration(&name), indent));
                stmt
            } else {
                cx.anchor
                    .clone()
                    .ok_or_else(|| LeakError::mismatch("construct is not inside a statement"))?
            };
            let indent = line_indent(source, stmt.start);
            let note = deferred_release(label, &release);
            edits.insert(line_end(source, stmt.end), format!("\n{indent}{}", indent_lines(&note, indent)));
            format!("Noted the release call for `{name}`; the owner of this {label} is unclear")
        };

        let contextless = cx.effect.is_none() && !cx.in_component;
        Ok(Planned {
            transformation: edits.collapse(source)?,
            confidence: score(family, synthesized, contextless),
            requires_manual_review: synthesized
                || contextless
                || family == ResourceFamily::Subscription
                || cx.nested_scope,
            description,
        })
    }
}

/// Family base, minus the synthesized-name, missing-context and subscription
/// penalties, clamped to the family floor.
#[must_use]
pub fn score(family: ResourceFamily, synthesized: bool, contextless: bool) -> f64 {
    let mut confidence = family.base_confidence();
    if synthesized {
        confidence -= 0.1;
    }
    if contextless {
        confidence -= 0.2;
    }
    if family == ResourceFamily::Subscription {
        confidence -= 0.05;
    }
    round2(confidence.max(family.confidence_floor()))
}

pub(super) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Adds `releases` to the effect's cleanup, creating the cleanup when there is none.
///
/// # Errors
/// Returns a pattern mismatch if a block body does not end in a closing brace.
pub fn add_cleanup(
    edits: &mut EditSet,
    source: &str,
    effect: &EffectAnchor,
    releases: &[String],
) -> Result<()> {
    match &effect.cleanup {
        Some(cleanup) if cleanup.is_block => {
            let brace = closing_brace(source, &cleanup.body)?;
            insert_before_brace(edits, source, brace, &releases.join("\n"));
        }
        Some(cleanup) => {
            let indent = line_indent(source, cleanup.body.start);
            let expr = relative(slice(source, cleanup.body.clone())?, indent);
            let mut statements = vec![format!("{expr};")];
            statements.extend(releases.iter().cloned());
            edits.replace(cleanup.body.clone(), indent_lines(&block(&statements), indent));
        }
        None if effect.body_is_block => {
            let brace = closing_brace(source, &effect.body)?;
            insert_before_brace(edits, source, brace, &cleanup_return(releases));
        }
        None => {
            let expr = relative(slice(source, effect.body.clone())?, &effect.indent);
            let body = block(&[format!("{expr};"), cleanup_return(releases)]);
            edits.replace(effect.body.clone(), indent_lines(&body, &effect.indent));
        }
    }
    Ok(())
}

fn closing_brace(source: &str, body: &Range<usize>) -> Result<usize> {
    let brace = body.end.saturating_sub(1);
    if body.end > body.start && source.as_bytes().get(brace) == Some(&b'}') {
        Ok(brace)
    } else {
        Err(LeakError::mismatch("block body has no closing brace"))
    }
}

fn line_end(source: &str, offset: usize) -> usize {
    source
        .get(offset..)
        .and_then(|rest| rest.find('\n'))
        .map_or(source.len(), |i| offset + i)
}

fn deferred_release(label: &str, release: &str) -> String {
    format!(
        "// Release this {label} when its owner is torn down:\n// {}",
        single_line(release)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn confidence_penalties_and_floors() {
        assert!((score(ResourceFamily::Stream, false, false) - 0.9).abs() < 1e-9);
        assert!((score(ResourceFamily::Interval, true, false) - 0.85).abs() < 1e-9);
        assert!((score(ResourceFamily::Subscription, false, false) - 0.8).abs() < 1e-9);
        assert!((score(ResourceFamily::EventListener, true, true) - 0.65).abs() < 1e-9);
        assert!((score(ResourceFamily::Subscription, true, true) - 0.5).abs() < 1e-9);
        assert!((score(ResourceFamily::Timeout, true, true) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn closing_brace_must_be_a_brace() {
        assert_eq!(closing_brace("{ a(); }", &(0..8)).unwrap(), 7);
        assert!(closing_brace("{ a(); ", &(0..7)).is_err());
    }

    #[test]
    fn line_end_stops_at_newline() {
        let src = "a(); b();\nc();";
        assert_eq!(line_end(src, 4), 9);
        assert_eq!(line_end(src, 12), src.len());
    }

    fn interval_fix(src: &str, line: usize, column: usize) -> crate::error::Result<crate::types::Fix> {
        crate::fix::generate_fix_at(src, "p.tsx", "unregistered-interval", line, column)
    }

    #[test]
    fn syntax_error_elsewhere_in_effect_is_rejected() {
        let src = "function A() {\n  useEffect(() => {\n    const id = setInterval(f, 1);\n    if (x {\n  }, []);\n  return null;\n}\n";
        let err = interval_fix(src, 3, 16).unwrap_err();
        assert!(matches!(err, LeakError::PatternMismatch(_)), "{err}");
    }

    #[test]
    fn syntax_error_in_existing_cleanup_is_rejected() {
        let src = "function A() {\n  useEffect(() => {\n    const id = setInterval(f, 1);\n    return () => {\n      log(;\n    };\n  }, []);\n  return null;\n}\n";
        let err = interval_fix(src, 3, 16).unwrap_err();
        assert!(matches!(err, LeakError::PatternMismatch(_)), "{err}");
    }

    #[test]
    fn syntax_error_in_another_function_does_not_block() {
        let src = "function A() {\n  useEffect(() => {\n    const id = setInterval(f, 1);\n  }, []);\n  return null;\n}\nfunction b() {\n  log(;\n}\n";
        let fix = interval_fix(src, 3, 16).unwrap();
        assert!(fix.fixed_code.contains("clearInterval(id);"));
    }

    #[test]
    fn module_level_timer_has_no_context() {
        let src = "import { tick } from './clock';\nsetInterval(tick, 1000);\n";
        let err = crate::fix::generate_fix_at(src, "m.ts", "unregistered-interval", 2, 1).unwrap_err();
        assert!(matches!(err, LeakError::MissingContext));

        let src = "const id = setInterval(tick, 1000);\n";
        let err = crate::fix::generate_fix_at(src, "m.ts", "unregistered-interval", 1, 12).unwrap_err();
        assert!(matches!(err, LeakError::MissingContext));
    }
}
