// src/detect/effect.rs
//! Effect blocks that start leak-prone work but return no cleanup callback.

use super::{connection_construct, is_listener_registration, timer_call, LeakDetector};
use crate::syntax;
use crate::types::{Finding, LeakType, Severity};
use tree_sitter::Node;

pub(super) fn check(cx: &LeakDetector, node: Node, out: &mut Vec<Finding>) {
    if node.kind() != "call_expression" {
        return;
    }
    let Some(callback) = cx.analyzer.effect_callback(node) else { return };
    if cx.analyzer.has_existing_cleanup(callback) {
        return;
    }
    let Some(body) = callback.child_by_field_name("body") else { return };
    let Some(what) = first_leak_prone(cx, body) else { return };

    let hook = syntax::callee_name(node, cx.src()).unwrap_or("useEffect");
    out.push(cx.finding(
        node,
        LeakType::MissingEffectCleanup,
        Severity::High,
        format!("{hook} starts {what} but returns no cleanup callback"),
        "Return a cleanup callback that releases everything the effect starts",
    ));
}

/// Label of the first stream/socket, event registration or timer in `body`.
fn first_leak_prone(cx: &LeakDetector, body: Node) -> Option<&'static str> {
    let src = cx.src();
    let mut what = None;
    syntax::walk(body, |n| {
        if what.is_some() {
            return false;
        }
        what = match n.kind() {
            "new_expression" => connection_construct(n, src).map(|k| match k {
                super::ConnectionKind::Stream => "a stream connection",
                super::ConnectionKind::Socket => "a socket connection",
            }),
            "call_expression" if is_listener_registration(n, src) => Some("an event listener"),
            "call_expression" => timer_call(n, src).map(|k| match k {
                super::TimerKind::Interval => "an interval",
                super::TimerKind::Timeout => "a timeout",
            }),
            _ => None,
        };
        what.is_none()
    });
    what
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::detect::scan_source;
    use crate::types::LeakType;

    fn effects(code: &str) -> Vec<String> {
        scan_source(code, "e.tsx")
            .unwrap()
            .into_iter()
            .filter(|f| f.leak_type == LeakType::MissingEffectCleanup)
            .map(|f| f.description)
            .collect()
    }

    #[test]
    fn flags_effect_with_timer_and_no_cleanup() {
        let code = "function A() { useEffect(() => { setTimeout(go, 5); }, []); return <i />; }";
        let found = effects(code);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("a timeout"));
    }

    #[test]
    fn namespaced_hook_is_recognized() {
        let code = "function A() { React.useLayoutEffect(() => { new WebSocket(u); }); }";
        let found = effects(code);
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with("useLayoutEffect starts a socket connection"));
    }

    #[test]
    fn effect_with_cleanup_is_fine() {
        let code = "function A() { useEffect(() => { const id = setInterval(f, 1); return () => clearInterval(id); }); }";
        assert!(effects(code).is_empty());
    }

    #[test]
    fn effect_without_leak_prone_work_is_fine() {
        assert!(effects("function A() { useEffect(() => { document.title = 'x'; }, []); }").is_empty());
    }

    #[test]
    fn subscriptions_alone_do_not_trigger_the_effect_check() {
        assert!(effects("function A() { useEffect(() => { store.subscribe(f); }, []); }").is_empty());
    }
}
