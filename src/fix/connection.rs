// src/fix/connection.rs
//! Stream/socket connections and subscriptions: both hand back an object the
//! owner must release, so they share one rule set.

use super::edit::construct_text;
use super::locate;
use super::pattern::{Pattern, PatternContext, Planned, ReleaseRules, ResourceFamily};
use crate::context::ContextAnalyzer;
use crate::detect::{connection_construct, is_subscription, ConnectionKind};
use crate::error::{LeakError, Result};
use crate::syntax::{callee_name, constructor_name, SyntaxIndex};
use crate::types::{Finding, LeakType};
use tree_sitter::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resource {
    Connection(ConnectionKind),
    Subscription,
}

pub struct ConnectionRules {
    resource: Resource,
    construct: String,
}

impl ConnectionRules {
    /// Rules for `new EventSource(..)`, `new WebSocket(..)` or `x.subscribe(..)`.
    #[must_use]
    pub fn from_node(index: &SyntaxIndex<'_>, node: Node) -> Option<Self> {
        let src = index.source();
        let resource = match node.kind() {
            "new_expression" => Resource::Connection(connection_construct(node, src)?),
            "call_expression" if is_subscription(node, src) => Resource::Subscription,
            _ => return None,
        };
        Some(Self {
            resource,
            construct: construct_text(index, node),
        })
    }

    fn leak_type(&self) -> LeakType {
        match self.resource {
            Resource::Connection(kind) => kind.leak_type(),
            Resource::Subscription => LeakType::UnregisteredSubscription,
        }
    }
}

impl ReleaseRules for ConnectionRules {
    fn family(&self) -> ResourceFamily {
        match self.resource {
            Resource::Connection(ConnectionKind::Stream) => ResourceFamily::Stream,
            Resource::Connection(ConnectionKind::Socket) => ResourceFamily::Socket,
            Resource::Subscription => ResourceFamily::Subscription,
        }
    }

    fn name_hint(&self) -> String {
        match self.resource {
            Resource::Connection(ConnectionKind::Stream) => "eventSource",
            Resource::Connection(ConnectionKind::Socket) => "socket",
            Resource::Subscription => "unsubscribe",
        }
        .to_string()
    }

    fn declaration(&self, name: &str) -> String {
        format!("const {name} = {};", self.construct)
    }

    fn release(&self, name: &str) -> String {
        match self.resource {
            Resource::Connection(ConnectionKind::Stream) => {
                format!("if ({name}.readyState !== EventSource.CLOSED) {name}.close();")
            }
            Resource::Connection(ConnectionKind::Socket) => format!(
                "if ({name}.readyState === WebSocket.OPEN || {name}.readyState === WebSocket.CONNECTING) {name}.close();"
            ),
            Resource::Subscription => format!("{name}();"),
        }
    }
}

pub type ConnectionPattern = Pattern<ConnectionRules>;

pub(super) fn generate(index: &SyntaxIndex<'_>, finding: &Finding) -> Result<Planned> {
    let src = index.source();
    let node = if finding.leak_type == LeakType::UnregisteredSubscription {
        locate(index, finding, "subscribe call", |n| {
            callee_name(n, src) == Some("subscribe")
        })?
    } else {
        locate(index, finding, "connection constructor", |n| {
            n.kind() == "new_expression"
        })?
    };
    let rules = ConnectionRules::from_node(index, node).ok_or_else(|| {
        let what = constructor_name(node, src)
            .map_or_else(|| "subscribe call without arguments".to_string(), |c| {
                format!("unsupported resource constructor `{c}`")
            });
        LeakError::mismatch(what)
    })?;
    if rules.leak_type() != finding.leak_type {
        return Err(LeakError::mismatch(format!(
            "construct does not match a {} finding",
            finding.leak_type
        )));
    }
    let bound = ContextAnalyzer::new(src).extract_bound_name(node);
    let context = PatternContext::analyze(index, node, bound)?;
    ConnectionPattern::new(rules, context).plan(src)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::error::LeakError;
    use crate::fix::generate_fix;
    use crate::scan_source;
    use crate::types::{Finding, LeakType, Severity};

    fn at(leak_type: LeakType, line: usize, column: usize) -> Finding {
        Finding {
            leak_type,
            severity: Severity::High,
            file: "c.tsx".into(),
            line,
            column,
            description: String::new(),
            suggested_fix: None,
            code_snippet: String::new(),
        }
    }

    #[test]
    fn stream_in_component_is_wrapped_with_guarded_close() {
        let src = "function Feed() {\n  const es = new EventSource('/x');\n  return <ul />;\n}\n";
        let finding = scan_source(src, "c.tsx").unwrap().remove(0);
        assert_eq!(finding.leak_type, LeakType::UnclosedStreamConnection);
        let fix = generate_fix(src, "c.tsx", &finding).unwrap();
        assert!(fix.fixed_code.contains("useEffect(() => {"));
        assert!(fix.fixed_code.contains("return () => {"));
        assert!(fix
            .fixed_code
            .contains("if (es.readyState !== EventSource.CLOSED) es.close();"));
        assert!((fix.confidence - 0.9).abs() < 1e-9);
        assert!(!fix.requires_manual_review);
    }

    #[test]
    fn socket_in_effect_with_existing_cleanup_keeps_it() {
        let src = "function Chat() {\n  useEffect(() => {\n    const ws = new WebSocket(url);\n    return () => {\n      log('bye');\n    };\n  }, [url]);\n  return null;\n}\n";
        let fix = generate_fix(src, "c.tsx", &at(LeakType::UnclosedSocketConnection, 3, 16)).unwrap();
        assert!(fix.fixed_code.contains("      log('bye');\n      if (ws.readyState === WebSocket.OPEN"));
        assert_eq!(fix.fixed_code.matches("ws.close()").count(), 1);
        assert_eq!(fix.fixed_code.matches("return () =>").count(), 1);
    }

    #[test]
    fn subscription_is_always_reviewed() {
        let src = "function Cart() {\n  useEffect(() => {\n    store.subscribe(render);\n  }, []);\n  return null;\n}\n";
        let finding = scan_source(src, "c.tsx")
            .unwrap()
            .into_iter()
            .find(|f| f.leak_type == LeakType::UnregisteredSubscription)
            .unwrap();
        let fix = generate_fix(src, "c.tsx", &finding).unwrap();
        assert!(fix.fixed_code.contains("const unsubscribe = store.subscribe(render);"));
        assert!(fix.fixed_code.contains("unsubscribe();"));
        assert!(fix.requires_manual_review);
        assert!((fix.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn unknown_constructor_is_a_mismatch() {
        let src = "function Feed() {\n  const w = new Worker('/w.js');\n}\n";
        let err = generate_fix(src, "c.tsx", &at(LeakType::UnclosedSocketConnection, 2, 13)).unwrap_err();
        assert!(matches!(err, LeakError::PatternMismatch(ref m) if m.contains("Worker")));
    }

    #[test]
    fn missing_node_is_a_position_miss() {
        let src = "function Feed() {}\n";
        let err = generate_fix(src, "c.tsx", &at(LeakType::UnclosedStreamConnection, 1, 2)).unwrap_err();
        assert!(err.is_position_miss());
    }
}
