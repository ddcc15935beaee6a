// src/detect/listener.rs
//! `addEventListener` without a matching `removeEventListener`.

use super::{is_listener_registration, LeakDetector};
use crate::syntax;
use crate::types::{Finding, LeakType, Severity};
use tree_sitter::Node;

pub(super) fn check(cx: &LeakDetector, node: Node, out: &mut Vec<Finding>) {
    if node.kind() != "call_expression" || !is_listener_registration(node, cx.src()) {
        return;
    }
    let src = cx.src();
    let args = syntax::arguments(node);
    let Some(event) = args.first().map(|a| cx.index.text_of(*a)) else { return };

    let scope = cx.scope_of(node);
    let removed = cx.scope_has_call(scope, |call| {
        syntax::callee_name(call, src) == Some("removeEventListener")
            && syntax::arguments(call)
                .first()
                .is_some_and(|a| cx.index.text_of(*a) == event)
    });
    if removed || cx.scope_has_cleanup(scope) {
        return;
    }

    let target = syntax::callee_object(node, src).unwrap_or("the global object");
    out.push(cx.finding(
        node,
        LeakType::UnregisteredEventListener,
        Severity::Medium,
        format!("{event} listener on {target} is never removed"),
        "Remove the listener in a cleanup callback with the same handler reference",
    ));
}
