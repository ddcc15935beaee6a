// src/detect/mod.rs
//! Leak detection: one walk over the tree, five independent checks per node.

mod connection;
mod effect;
mod listener;
mod subscription;
mod timer;

use crate::context::ContextAnalyzer;
use crate::error::Result;
use crate::syntax::{self, enclosing_function, location, SyntaxIndex};
use crate::types::{Finding, LeakDetectionResult, LeakType, Severity};
use std::collections::HashSet;
use tree_sitter::Node;

/// Scans one source unit and returns its findings in document order.
///
/// # Errors
/// Returns `LeakError::Parse` if the source cannot be parsed at all.
pub fn scan_source(source: &str, file_name: &str) -> Result<Vec<Finding>> {
    let index = SyntaxIndex::parse(source, file_name)?;
    let findings = LeakDetector::new(&index).run();
    tracing::debug!(file = file_name, count = findings.len(), "scan complete");
    Ok(findings)
}

/// Keeps the first finding per (type, line, column).
fn dedup(findings: Vec<Finding>) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert((f.leak_type, f.line, f.column)))
        .collect()
}

/// Shared state for the checks during one walk.
pub(crate) struct LeakDetector<'a, 's> {
    index: &'a SyntaxIndex<'s>,
    analyzer: ContextAnalyzer<'s>,
}

impl<'a, 's> LeakDetector<'a, 's> {
    pub(crate) fn new(index: &'a SyntaxIndex<'s>) -> Self {
        Self {
            index,
            analyzer: ContextAnalyzer::new(index.source()),
        }
    }

    pub(crate) fn run(&self) -> Vec<Finding> {
        let mut out = Vec::new();
        syntax::walk(self.index.root(), |node| {
            connection::check(self, node, &mut out);
            subscription::check(self, node, &mut out);
            timer::check(self, node, &mut out);
            listener::check(self, node, &mut out);
            effect::check(self, node, &mut out);
            true
        });
        dedup(out)
    }

    fn src(&self) -> &'s str {
        self.index.source()
    }

    fn finding(
        &self,
        node: Node,
        leak_type: LeakType,
        severity: Severity,
        description: String,
        suggested_fix: &str,
    ) -> Finding {
        let (line, column) = location(node);
        tracing::debug!(%leak_type, line, column, "leak detected");
        LeakDetectionResult {
            leak_type,
            severity,
            file: self.index.file_name().to_string(),
            line,
            column,
            description,
            suggested_fix: Some(suggested_fix.to_string()),
            code_snippet: self.index.text_of(node).to_string(),
        }
    }

    /// Enclosing function of `node`, or the program root at module level.
    fn scope_of<'t>(&self, node: Node<'t>) -> Node<'t> {
        enclosing_function(node)
            .unwrap_or_else(|| syntax::self_and_ancestors(node).last().unwrap_or(node))
    }

    /// Whether the scope already returns a cleanup callback.
    ///
    /// Known approximation: any returned function counts, whether or not it
    /// releases the resource under analysis.
    fn scope_has_cleanup(&self, scope: Node) -> bool {
        syntax::is_function_like(scope) && self.analyzer.has_existing_cleanup(scope)
    }

    /// Whether any call inside `scope` (nested functions included) satisfies `pred`.
    fn scope_has_call(&self, scope: Node, mut pred: impl FnMut(Node) -> bool) -> bool {
        let mut found = false;
        syntax::walk(scope, |n| {
            if !found && n.kind() == "call_expression" && pred(n) {
                found = true;
            }
            !found
        });
        found
    }

    /// Whether the construct's value is kept: bound to a name or returned.
    fn is_captured(&self, node: Node) -> bool {
        self.analyzer.extract_bound_name(node).is_some() || self.analyzer.is_returned(node)
    }

    /// True inside a UI-component function or an effect block.
    fn in_component_context(&self, scope: Node) -> bool {
        syntax::is_function_like(scope)
            && (self.analyzer.is_component_function(scope)
                || self.analyzer.is_inside_effect_block(scope))
    }
}

/// Resource-constructing expressions the detector and the fix generators agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Stream,
    Socket,
}

impl ConnectionKind {
    #[must_use]
    pub fn from_constructor(name: &str) -> Option<Self> {
        match name {
            "EventSource" => Some(Self::Stream),
            "WebSocket" => Some(Self::Socket),
            _ => None,
        }
    }

    #[must_use]
    pub fn constructor(self) -> &'static str {
        match self {
            Self::Stream => "EventSource",
            Self::Socket => "WebSocket",
        }
    }

    #[must_use]
    pub fn leak_type(self) -> LeakType {
        match self {
            Self::Stream => LeakType::UnclosedStreamConnection,
            Self::Socket => LeakType::UnclosedSocketConnection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Interval,
    Timeout,
}

impl TimerKind {
    #[must_use]
    pub fn from_callee(name: &str) -> Option<Self> {
        match name {
            "setInterval" => Some(Self::Interval),
            "setTimeout" => Some(Self::Timeout),
            _ => None,
        }
    }

    #[must_use]
    pub fn start_fn(self) -> &'static str {
        match self {
            Self::Interval => "setInterval",
            Self::Timeout => "setTimeout",
        }
    }

    #[must_use]
    pub fn clear_fn(self) -> &'static str {
        match self {
            Self::Interval => "clearInterval",
            Self::Timeout => "clearTimeout",
        }
    }

    #[must_use]
    pub fn leak_type(self) -> LeakType {
        match self {
            Self::Interval => LeakType::UnregisteredInterval,
            Self::Timeout => LeakType::UnregisteredTimeout,
        }
    }
}

/// Receivers a timer call may be qualified with.
const TIMER_RECEIVERS: &[&str] = &["window", "globalThis", "self"];

/// `setInterval(..)` / `window.setTimeout(..)` with at least one argument.
#[must_use]
pub fn timer_call(node: Node, src: &str) -> Option<TimerKind> {
    let kind = TimerKind::from_callee(syntax::callee_name(node, src)?)?;
    let receiver_ok =
        syntax::callee_object(node, src).map_or(true, |obj| TIMER_RECEIVERS.contains(&obj));
    (receiver_ok && !syntax::arguments(node).is_empty()).then_some(kind)
}

/// `new EventSource(..)` / `new WebSocket(..)`.
#[must_use]
pub fn connection_construct(node: Node, src: &str) -> Option<ConnectionKind> {
    ConnectionKind::from_constructor(syntax::constructor_name(node, src)?)
}

/// `target.addEventListener(event, handler, ..)`.
#[must_use]
pub fn is_listener_registration(node: Node, src: &str) -> bool {
    syntax::callee_name(node, src) == Some("addEventListener") && syntax::arguments(node).len() >= 2
}

/// A `subscribe(..)`-shaped call with at least one argument.
#[must_use]
pub fn is_subscription(node: Node, src: &str) -> bool {
    syntax::callee_name(node, src) == Some("subscribe") && !syntax::arguments(node).is_empty()
}
