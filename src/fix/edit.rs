// src/fix/edit.rs
//! Edit collection and text helpers shared by the generators.
//!
//! Generators may need to touch more than one place (a declaration and a
//! cleanup body, say). The edits are collected here and collapsed into one
//! contiguous transformation that reproduces the untouched text between them.

use crate::error::{LeakError, Result};
use crate::syntax::{line_indent, line_start, starts_line, SyntaxIndex};
use crate::types::Transformation;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;
use tree_sitter::Node;

pub const INDENT: &str = "  ";

#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<(Range<usize>, String)>,
}

impl EditSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, span: Range<usize>, text: String) {
        self.edits.push((span, text));
    }

    pub fn insert(&mut self, at: usize, text: String) {
        self.edits.push((at..at, text));
    }

    /// Collapses the edits into one transformation spanning all of them.
    ///
    /// # Errors
    /// Returns a pattern mismatch when there is nothing to do or two edits overlap.
    pub fn collapse(mut self, source: &str) -> Result<Transformation> {
        self.edits.sort_by_key(|(span, _)| (span.start, span.end));
        let (Some(first), Some(last)) = (self.edits.first(), self.edits.last()) else {
            return Err(LeakError::mismatch("no edit was produced"));
        };
        let start = first.0.start;
        let end = self.edits.iter().map(|(s, _)| s.end).max().unwrap_or(last.0.end);

        let mut replacement = String::new();
        let mut cursor = start;
        for (span, text) in &self.edits {
            if span.start < cursor {
                return Err(LeakError::mismatch("overlapping edits"));
            }
            replacement.push_str(slice(source, cursor..span.start)?);
            replacement.push_str(text);
            cursor = span.end;
        }
        Ok(Transformation::new(start, end, replacement))
    }
}

/// Checked `source[range]`.
///
/// # Errors
/// Returns a pattern mismatch if the range is outside the source.
pub fn slice(source: &str, range: Range<usize>) -> Result<&str> {
    source
        .get(range.clone())
        .ok_or_else(|| LeakError::mismatch(format!("span {range:?} is outside the source")))
}

/// Inserts `statement` as the last line of the block whose closing brace is at `brace`.
///
/// When the brace sits on its own line the statement goes on a new line above
/// it, one level deeper than the brace; otherwise it is placed inline.
pub fn insert_before_brace(edits: &mut EditSet, source: &str, brace: usize, statement: &str) {
    if starts_line(source, brace) {
        let inner = format!("{}{INDENT}", line_indent(source, brace));
        let body = indent_lines(statement, &inner);
        edits.insert(line_start(source, brace), format!("{inner}{body}\n"));
    } else {
        let pad = if preceded_by_space(source, brace) { "" } else { " " };
        edits.insert(brace, format!("{pad}{} ", single_line(statement)));
    }
}

fn preceded_by_space(source: &str, at: usize) -> bool {
    source
        .get(..at)
        .and_then(|head| head.chars().last())
        .is_some_and(char::is_whitespace)
}

// Generated fragments are relative: continuation lines are indented relative
// to the first line, and `indent_lines` places them at their final column.

/// Prefixes every line after the first with `indent`.
#[must_use]
pub fn indent_lines(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

/// Strips `indent` from every line after the first, turning source text into a relative fragment.
#[must_use]
pub fn relative(text: &str, indent: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| if i == 0 { line } else { line.strip_prefix(indent).unwrap_or(line) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Source text of `node` as a relative fragment.
#[must_use]
pub fn construct_text(index: &SyntaxIndex<'_>, node: Node) -> String {
    let src = index.source();
    relative(index.raw_text(node), line_indent(src, node.start_byte()))
}

/// Joins a multi-line statement onto one line.
#[must_use]
pub fn single_line(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join(" ")
}

/// `{ <statements> }` with one statement per line.
#[must_use]
pub fn block(statements: &[String]) -> String {
    let mut out = String::from("{\n");
    for statement in statements {
        out.push_str(INDENT);
        out.push_str(&indent_lines(statement, INDENT));
        out.push('\n');
    }
    out.push('}');
    out
}

/// `return () => { <releases> };`
#[must_use]
pub fn cleanup_return(releases: &[String]) -> String {
    format!("return () => {};", block(releases))
}

/// A new effect block whose body runs `body` and returns a cleanup with `releases`.
#[must_use]
pub fn effect_wrapper(api: &str, body: &str, releases: &[String]) -> String {
    let callback = block(&[body.to_string(), cleanup_return(releases)]);
    format!("{api}(() => {callback}, []);")
}

static BARE_EFFECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^.\w])useEffect\b").unwrap_or_else(|_| panic!("Invalid Regex"))
});

/// Spelling of the effect hook to emit for this file.
#[must_use]
pub fn effect_api(source: &str) -> &'static str {
    let bare = BARE_EFFECT_RE.is_match(source);
    if !bare && source.contains("React.useEffect") {
        "React.useEffect"
    } else {
        "useEffect"
    }
}

/// Picks `hint`, or `hint2`, `hint3`, ... so the name is free in `source` and not in `taken`.
pub fn unique_name(source: &str, hint: &str, taken: &mut HashSet<String>) -> String {
    let mut n = 1;
    loop {
        let candidate = if n == 1 { hint.to_string() } else { format!("{hint}{n}") };
        let in_source = Regex::new(&format!(r"\b{}\b", regex::escape(&candidate)))
            .is_ok_and(|re| re.is_match(source));
        if !in_source && !taken.contains(&candidate) {
            taken.insert(candidate.clone());
            return candidate;
        }
        n += 1;
    }
}

/// `handle` + PascalCase event name for a string-literal event, `handler` otherwise.
#[must_use]
pub fn handler_name_hint(event: &str) -> String {
    let Some(inner) = ['\'', '"', '`']
        .into_iter()
        .find_map(|q| event.strip_prefix(q)?.strip_suffix(q))
    else {
        return "handler".to_string();
    };
    let mut name = String::from("handle");
    for part in inner.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            name.push(first.to_ascii_uppercase());
            name.push_str(chars.as_str());
        }
    }
    if name == "handle" {
        "handler".to_string()
    } else {
        name
    }
}
