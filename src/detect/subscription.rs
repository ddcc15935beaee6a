// src/detect/subscription.rs
//! `subscribe(..)` calls whose unsubscriber is dropped.

use super::{is_subscription, LeakDetector};
use crate::syntax;
use crate::types::{Finding, LeakType, Severity};
use tree_sitter::Node;

pub(super) fn check(cx: &LeakDetector, node: Node, out: &mut Vec<Finding>) {
    if node.kind() != "call_expression" || !is_subscription(node, cx.src()) {
        return;
    }
    if cx.is_captured(node) {
        return;
    }
    let scope = cx.scope_of(node);
    let unsubscribed =
        cx.scope_has_call(scope, |call| syntax::callee_name(call, cx.src()) == Some("unsubscribe"));
    if unsubscribed || cx.scope_has_cleanup(scope) {
        return;
    }

    let target = syntax::callee_object(node, cx.src()).unwrap_or("source");
    out.push(cx.finding(
        node,
        LeakType::UnregisteredSubscription,
        Severity::Medium,
        format!("Subscription to `{target}` is never released; its unsubscriber is discarded"),
        "Keep the returned unsubscriber and call it on cleanup: const unsubscribe = x.subscribe(..); return () => unsubscribe();",
    ));
}
