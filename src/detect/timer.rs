// src/detect/timer.rs
//! Intervals and timeouts whose handles are never cleared.

use super::{timer_call, LeakDetector, TimerKind};
use crate::syntax;
use crate::types::{Finding, Severity};
use tree_sitter::Node;

pub(super) fn check(cx: &LeakDetector, node: Node, out: &mut Vec<Finding>) {
    if node.kind() != "call_expression" {
        return;
    }
    let src = cx.src();
    let Some(kind) = timer_call(node, src) else { return };

    let scope = cx.scope_of(node);
    let name = cx.analyzer.extract_bound_name(node);
    let cleared = name.as_deref().is_some_and(|name| {
        cx.scope_has_call(scope, |call| {
            syntax::callee_name(call, src) == Some(kind.clear_fn())
                && syntax::arguments(call)
                    .first()
                    .is_some_and(|arg| arg.utf8_text(src.as_bytes()) == Ok(name))
        })
    });
    if cleared || cx.scope_has_cleanup(scope) {
        return;
    }

    let is_function = syntax::is_function_like(scope);
    let in_effect = is_function && cx.analyzer.is_inside_effect_block(scope);
    let in_render = is_function && !in_effect && cx.analyzer.is_component_function(scope);

    let (severity, description) = match kind {
        TimerKind::Interval if in_render => (
            Severity::Critical,
            "setInterval started during render; every render adds another interval".to_string(),
        ),
        TimerKind::Interval => (
            Severity::High,
            "setInterval handle is never cleared; the callback keeps firing".to_string(),
        ),
        TimerKind::Timeout if cx.in_component_context(scope) => (
            Severity::Low,
            "setTimeout is never cleared; the callback may run after unmount".to_string(),
        ),
        TimerKind::Timeout => return,
    };
    let suggestion = match kind {
        TimerKind::Interval => "const id = setInterval(..); return () => clearInterval(id);",
        TimerKind::Timeout => "const id = setTimeout(..); return () => clearTimeout(id);",
    };
    out.push(cx.finding(node, kind.leak_type(), severity, description, suggestion));
}
