// src/fix/listener.rs
//! Event-listener fixes. The handler is the binding: a named handler is
//! removed as-is, an inline one is hoisted into a `const` first.

use super::edit::{handler_name_hint, relative, single_line};
use super::locate;
use super::pattern::{Pattern, PatternContext, Planned, ReleaseRules, ResourceFamily};
use crate::detect::is_listener_registration;
use crate::error::{LeakError, Result};
use crate::syntax::{self, callee_name, line_indent, unwrap_expression, SyntaxIndex};
use crate::types::Finding;
use tree_sitter::Node;

pub struct ListenerRules {
    /// `window.` or empty for a bare `addEventListener`.
    receiver: String,
    event: String,
    options: Option<String>,
    handler: String,
    /// Call text up to the handler, and after it.
    head: String,
    tail: String,
    handler_is_named: bool,
}

impl ListenerRules {
    #[must_use]
    pub fn from_node(index: &SyntaxIndex<'_>, call: Node) -> Option<Self> {
        let src = index.source();
        if !is_listener_registration(call, src) {
            return None;
        }
        let args = syntax::arguments(call);
        let (event, handler) = (*args.first()?, *args.get(1)?);
        let indent = line_indent(src, call.start_byte());
        let text = |range: std::ops::Range<usize>| relative(src.get(range).unwrap_or(""), indent);

        Some(Self {
            receiver: syntax::callee_object(call, src)
                .map(|obj| format!("{obj}."))
                .unwrap_or_default(),
            event: single_line(index.text_of(event)),
            options: args.get(2).map(|opts| single_line(index.text_of(*opts))),
            handler: text(handler.start_byte()..handler.end_byte()),
            head: text(call.start_byte()..handler.start_byte()),
            tail: text(handler.end_byte()..call.end_byte()),
            handler_is_named: matches!(
                unwrap_expression(handler).kind(),
                "identifier" | "member_expression"
            ),
        })
    }

    /// The handler's name when it is an identifier or member expression.
    #[must_use]
    pub fn bound_handler(&self) -> Option<String> {
        self.handler_is_named.then(|| self.handler.clone())
    }
}

impl ReleaseRules for ListenerRules {
    fn family(&self) -> ResourceFamily {
        ResourceFamily::EventListener
    }

    fn name_hint(&self) -> String {
        handler_name_hint(&self.event)
    }

    fn declaration(&self, name: &str) -> String {
        format!(
            "const {name} = {};\n{}{name}{};",
            self.handler, self.head, self.tail
        )
    }

    fn release(&self, name: &str) -> String {
        let options = self
            .options
            .as_deref()
            .map(|opts| format!(", {opts}"))
            .unwrap_or_default();
        format!(
            "{}removeEventListener({}, {name}{options});",
            self.receiver, self.event
        )
    }
}

pub type EventListenerPattern = Pattern<ListenerRules>;

pub(super) fn generate(index: &SyntaxIndex<'_>, finding: &Finding) -> Result<Planned> {
    let src = index.source();
    let call = locate(index, finding, "addEventListener call", |n| {
        callee_name(n, src) == Some("addEventListener")
    })?;
    let rules = ListenerRules::from_node(index, call)
        .ok_or_else(|| LeakError::mismatch("addEventListener call needs an event and a handler"))?;
    let context = PatternContext::analyze(index, call, rules.bound_handler())?;
    EventListenerPattern::new(rules, context).plan(src)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::error::LeakError;
    use crate::fix::generate_fix;
    use crate::scan_source;
    use crate::types::{Finding, LeakType};

    fn listener(src: &str) -> Finding {
        scan_source(src, "l.tsx")
            .unwrap()
            .into_iter()
            .find(|f| f.leak_type == LeakType::UnregisteredEventListener)
            .unwrap()
    }

    #[test]
    fn named_handler_is_removed_in_cleanup() {
        let src = "function Size() {\n  useEffect(() => {\n    window.addEventListener('resize', onResize, { passive: true });\n  }, []);\n  return null;\n}\n";
        let fix = generate_fix(src, "l.tsx", &listener(src)).unwrap();
        assert!(fix
            .fixed_code
            .contains("window.removeEventListener('resize', onResize, { passive: true });"));
        assert!(!fix.requires_manual_review);
        assert!(fix.confidence >= 0.9);
    }

    #[test]
    fn inline_handler_is_hoisted_and_flagged() {
        let src = "function Size() {\n  useEffect(() => {\n    window.addEventListener('resize', () => {\n      measure();\n    });\n  }, []);\n  return null;\n}\n";
        let fix = generate_fix(src, "l.tsx", &listener(src)).unwrap();
        assert!(fix.fixed_code.contains(
            "    const handleResize = () => {\n      measure();\n    };\n    window.addEventListener('resize', handleResize);"
        ));
        assert!(fix.fixed_code.contains("window.removeEventListener('resize', handleResize);"));
        assert!(fix.requires_manual_review);
        assert!(fix.confidence < 0.9);
    }

    #[test]
    fn expression_bodied_effect_becomes_a_block() {
        let src = "function Keys() {\n  useEffect(() => document.addEventListener('keydown', onKey), []);\n  return null;\n}\n";
        let fix = generate_fix(src, "l.tsx", &listener(src)).unwrap();
        assert!(fix.fixed_code.contains(
            "  useEffect(() => {\n    document.addEventListener('keydown', onKey);\n    return () => {\n      document.removeEventListener('keydown', onKey);\n    };\n  }, []);"
        ));
    }

    #[test]
    fn missing_handler_is_a_mismatch() {
        let src = "function Size() {\n  window.addEventListener('resize');\n}\n";
        let finding = Finding {
            leak_type: LeakType::UnregisteredEventListener,
            severity: crate::types::Severity::Medium,
            file: "l.tsx".into(),
            line: 2,
            column: 3,
            description: String::new(),
            suggested_fix: None,
            code_snippet: String::new(),
        };
        let err = generate_fix(src, "l.tsx", &finding).unwrap_err();
        assert!(matches!(err, LeakError::PatternMismatch(_)));
    }
}
