// src/detect/connection.rs
//! Stream and socket connections that are never closed.

use super::{connection_construct, ConnectionKind, LeakDetector};
use crate::syntax;
use crate::types::{Finding, Severity};
use tree_sitter::Node;

pub(super) fn check(cx: &LeakDetector, node: Node, out: &mut Vec<Finding>) {
    if node.kind() != "new_expression" {
        return;
    }
    let src = cx.src();
    let Some(kind) = connection_construct(node, src) else { return };

    let scope = cx.scope_of(node);
    let name = cx.analyzer.extract_bound_name(node);
    let closed = name.as_deref().is_some_and(|name| {
        cx.scope_has_call(scope, |call| {
            syntax::callee_name(call, src) == Some("close")
                && syntax::callee_object(call, src) == Some(name)
        })
    });
    if closed || cx.scope_has_cleanup(scope) {
        return;
    }

    let ctor = kind.constructor();
    let (description, suggestion) = match kind {
        ConnectionKind::Stream => (
            format!("{ctor} connection is never closed; the stream stays open after unmount"),
            "Close the stream in a cleanup callback: return () => source.close();",
        ),
        ConnectionKind::Socket => (
            format!("{ctor} connection is never closed; the socket outlives its owner"),
            "Close the socket in a cleanup callback: return () => socket.close();",
        ),
    };
    out.push(cx.finding(node, kind.leak_type(), Severity::High, description, suggestion));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::detect::scan_source;
    use crate::types::{LeakType, Severity};

    fn types_of(code: &str) -> Vec<LeakType> {
        scan_source(code, "c.tsx")
            .unwrap()
            .into_iter()
            .map(|f| f.leak_type)
            .collect()
    }

    #[test]
    fn flags_unclosed_stream() {
        let code = "function Feed() { const es = new EventSource('/events'); return <ul />; }";
        let findings = scan_source(code, "c.tsx").unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].leak_type, LeakType::UnclosedStreamConnection);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].code_snippet, "new EventSource('/events')");
        assert_eq!((findings[0].line, findings[0].column), (1, 30));
    }

    #[test]
    fn flags_unclosed_socket() {
        let code = "function connect(url) { const ws = new WebSocket(url); ws.send('hi'); }";
        assert_eq!(types_of(code), vec![LeakType::UnclosedSocketConnection]);
    }

    #[test]
    fn skips_when_closed_in_scope() {
        let code = "function connect(url) { const ws = new WebSocket(url); const stop = () => ws.close(); }";
        assert!(types_of(code).is_empty());
    }

    #[test]
    fn close_on_a_different_name_does_not_count() {
        let code = "function connect(url) { const ws = new WebSocket(url); other.close(); }";
        assert_eq!(types_of(code), vec![LeakType::UnclosedSocketConnection]);
    }

    #[test]
    fn unrelated_constructors_are_ignored() {
        assert!(types_of("function f() { const m = new Map(); }").is_empty());
    }
}
