// src/fix/effect.rs
//! Effect blocks without cleanup: release everything the callback starts in
//! one returned cleanup callback.

use super::connection::ConnectionRules;
use super::edit::{block, cleanup_return, indent_lines, relative, slice, unique_name, EditSet};
use super::listener::ListenerRules;
use super::locate;
use super::pattern::{add_cleanup, round2, EffectAnchor, Planned, ReleaseRules, ResourceFamily};
use super::timer::TimerRules;
use crate::context::{standalone_statement, ContextAnalyzer, EffectBlock};
use crate::error::{LeakError, Result};
use crate::syntax::{
    self, in_malformed_region, is_function_like, line_indent, span, unwrap_expression, SyntaxIndex,
};
use crate::types::Finding;
use std::collections::HashSet;
use std::ops::Range;
use tree_sitter::Node;

/// One leak-prone construct found in the callback.
struct Item<'t> {
    node: Node<'t>,
    rules: Box<dyn ReleaseRules>,
    bound: Option<String>,
}

fn classify<'t>(index: &SyntaxIndex<'_>, analyzer: &ContextAnalyzer<'_>, node: Node<'t>) -> Option<Item<'t>> {
    if let Some(rules) = ListenerRules::from_node(index, node) {
        let bound = rules.bound_handler();
        return Some(Item { node, rules: Box::new(rules), bound });
    }
    if let Some(rules) = TimerRules::from_node(index, node) {
        return Some(Item { node, rules: Box::new(rules), bound: analyzer.extract_bound_name(node) });
    }
    let rules = ConnectionRules::from_node(index, node)?;
    if rules.family() == ResourceFamily::Subscription && analyzer.is_returned(node) {
        return None;
    }
    Some(Item { node, rules: Box::new(rules), bound: analyzer.extract_bound_name(node) })
}

/// Leak-prone constructs inside `func`, counted without descending further.
fn count_nested(index: &SyntaxIndex<'_>, analyzer: &ContextAnalyzer<'_>, func: Node) -> usize {
    let mut count = 0;
    syntax::walk(func, |n| {
        if classify(index, analyzer, n).is_some() {
            count += 1;
        }
        true
    });
    count
}

pub(super) fn generate(index: &SyntaxIndex<'_>, finding: &Finding) -> Result<Planned> {
    let src = index.source();
    let analyzer = ContextAnalyzer::new(src);
    let call = locate(index, finding, "effect call", |n| analyzer.is_effect_call(n))?;
    let callback = analyzer
        .effect_callback(call)
        .ok_or_else(|| LeakError::mismatch("effect call has no callback function"))?;
    let effect = EffectBlock { call, callback };
    if in_malformed_region(call) {
        return Err(LeakError::mismatch("effect block contains a syntax error"));
    }
    let anchor = EffectAnchor::of(src, &analyzer, effect)?;
    let cleanup_fn = analyzer.cleanup_callback(effect.callback);
    let body = effect
        .callback
        .child_by_field_name("body")
        .ok_or_else(|| LeakError::mismatch("effect callback has no body"))?;

    let mut items = Vec::new();
    let mut skipped = 0;
    syntax::walk(body, |n| {
        if Some(n) == cleanup_fn {
            return false;
        }
        if is_function_like(n) {
            skipped += count_nested(index, &analyzer, n);
            return false;
        }
        items.extend(classify(index, &analyzer, n));
        true
    });

    let callback_text = index.raw_text(effect.callback);
    let body_expr = (!anchor.body_is_block).then(|| unwrap_expression(body));
    let mut taken = HashSet::new();
    let mut releases: Vec<String> = Vec::new();
    let mut declarations: Vec<(Range<usize>, String)> = Vec::new();
    let mut body_declaration = None;
    let (mut synthesized, mut subscription) = (false, false);

    for item in &items {
        let (name, declaration) = match &item.bound {
            Some(name) => (name.clone(), None),
            None => {
                let name = unique_name(src, &item.rules.name_hint(), &mut taken);
                let declaration = item.rules.declaration(&name);
                (name, Some(declaration))
            }
        };
        let release = item.rules.release(&name);
        if item.bound.is_some() && callback_text.contains(release.trim_end_matches(';')) {
            continue;
        }
        if let Some(declaration) = declaration {
            if body_expr == Some(item.node) {
                body_declaration = Some(declaration);
            } else if let Some(stmt) = standalone_statement(item.node) {
                let indent = line_indent(src, stmt.start_byte());
                declarations.push((span(stmt), indent_lines(&declaration, indent)));
            } else {
                skipped += 1;
                continue;
            }
            synthesized = true;
        }
        subscription |= item.rules.family() == ResourceFamily::Subscription;
        if !releases.contains(&release) {
            releases.push(release);
        }
    }
    if releases.is_empty() {
        return Err(LeakError::mismatch("effect block starts nothing that needs releasing"));
    }

    let mut edits = EditSet::new();
    match (body_expr, &anchor.cleanup) {
        (Some(expr), None) => {
            let lead = match body_declaration {
                Some(declaration) => declaration,
                None => format!("{};", relative(slice(src, span(expr))?, &anchor.indent)),
            };
            let text = block(&[lead, cleanup_return(&releases)]);
            edits.replace(anchor.body.clone(), indent_lines(&text, &anchor.indent));
        }
        _ => {
            for (stmt, text) in declarations {
                edits.replace(stmt, text);
            }
            add_cleanup(&mut edits, src, &anchor, &releases)?;
        }
    }

    let mut confidence: f64 = 0.9;
    if synthesized {
        confidence -= 0.1;
    }
    if subscription {
        confidence -= 0.05;
    }
    if skipped > 0 {
        confidence -= 0.1;
    }
    let count = releases.len();
    let noun = if count == 1 { "resource" } else { "resources" };
    let description = if anchor.cleanup.is_some() {
        format!("Added {count} release call(s) to the existing effect cleanup")
    } else {
        format!("Returned a cleanup callback that releases {count} {noun} started by the effect")
    };

    Ok(Planned {
        transformation: edits.collapse(src)?,
        confidence: round2(confidence.max(0.5)),
        requires_manual_review: synthesized || subscription || skipped > 0,
        description,
    })
}
