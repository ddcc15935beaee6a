// src/fix/timer.rs
//! Interval and timeout fixes: bind the handle, clear it on teardown.

use super::edit::construct_text;
use super::locate;
use super::pattern::{Pattern, PatternContext, Planned, ReleaseRules, ResourceFamily};
use crate::context::ContextAnalyzer;
use crate::detect::{timer_call, TimerKind};
use crate::error::{LeakError, Result};
use crate::syntax::{callee_name, SyntaxIndex};
use crate::types::Finding;
use tree_sitter::Node;

pub struct TimerRules {
    kind: TimerKind,
    construct: String,
}

impl TimerRules {
    /// Rules for a recognized timer start, `None` for anything else.
    #[must_use]
    pub fn from_node(index: &SyntaxIndex<'_>, node: Node) -> Option<Self> {
        let kind = timer_call(node, index.source())?;
        Some(Self {
            kind,
            construct: construct_text(index, node),
        })
    }
}

impl ReleaseRules for TimerRules {
    fn family(&self) -> ResourceFamily {
        match self.kind {
            TimerKind::Interval => ResourceFamily::Interval,
            TimerKind::Timeout => ResourceFamily::Timeout,
        }
    }

    fn name_hint(&self) -> String {
        match self.kind {
            TimerKind::Interval => "interval".to_string(),
            TimerKind::Timeout => "timeout".to_string(),
        }
    }

    fn declaration(&self, name: &str) -> String {
        format!("const {name} = {};", self.construct)
    }

    fn release(&self, name: &str) -> String {
        format!("{}({name});", self.kind.clear_fn())
    }
}

pub type TimerPattern = Pattern<TimerRules>;

pub(super) fn generate(index: &SyntaxIndex<'_>, finding: &Finding) -> Result<Planned> {
    let src = index.source();
    let call = locate(index, finding, "timer call", |n| {
        callee_name(n, src).is_some_and(|name| TimerKind::from_callee(name).is_some())
    })?;
    let rules = TimerRules::from_node(index, call)
        .ok_or_else(|| LeakError::mismatch("timer call has no callback or an unknown receiver"))?;
    if rules.kind.leak_type() != finding.leak_type {
        return Err(LeakError::mismatch(format!(
            "{} does not match a {} finding",
            rules.kind.start_fn(),
            finding.leak_type
        )));
    }
    let bound = ContextAnalyzer::new(src).extract_bound_name(call);
    let context = PatternContext::analyze(index, call, bound)?;
    TimerPattern::new(rules, context).plan(src)
}
