// src/syntax.rs
//! Syntax indexer: parses one source unit and answers position, ancestry and
//! text queries against the resulting tree. Read-only after construction.

use crate::error::{LeakError, Result};
use crate::lang::Lang;
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

/// A parsed source unit plus the line table needed to map 1-based positions.
pub struct SyntaxIndex<'s> {
    source: &'s str,
    file_name: String,
    tree: Tree,
    line_starts: Vec<usize>,
}

impl<'s> SyntaxIndex<'s> {
    /// Parses `source`, picking the grammar from `file_name`.
    ///
    /// # Errors
    /// Returns `LeakError::Parse` if the grammar cannot be loaded or the parser yields no tree.
    pub fn parse(source: &'s str, file_name: &str) -> Result<Self> {
        let lang = Lang::from_file_name(file_name);
        let mut parser = Parser::new();
        parser
            .set_language(lang.grammar())
            .map_err(|e| LeakError::Parse {
                file: file_name.to_string(),
                reason: e.to_string(),
            })?;

        let tree = parser.parse(source, None).ok_or_else(|| LeakError::Parse {
            file: file_name.to_string(),
            reason: "parser produced no tree".to_string(),
        })?;

        Ok(Self {
            source,
            file_name: file_name.to_string(),
            tree,
            line_starts: line_starts(source),
        })
    }

    #[must_use]
    pub fn source(&self) -> &'s str {
        self.source
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Converts a 1-based line/column into an absolute byte offset. Columns
    /// count UTF-8 bytes, not characters. Positions past the end of their line
    /// (or of the file) yield `None`.
    #[must_use]
    pub fn offset_of(&self, line: usize, column: usize) -> Option<usize> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line - 1)?;
        let line_end = self
            .line_starts
            .get(line)
            .map_or(self.source.len(), |next| next - 1);
        (column - 1 < line_end - start).then_some(start + column - 1)
    }

    /// Deepest node whose span contains the position, or `None` when the
    /// position lies outside every node.
    #[must_use]
    pub fn node_at_position(&self, line: usize, column: usize) -> Option<Node<'_>> {
        let offset = self.offset_of(line, column)?;
        let mut node = self.root();
        if !spans(node, offset) {
            return None;
        }
        loop {
            let mut cursor = node.walk();
            let next = node.children(&mut cursor).find(|c| spans(*c, offset));
            match next {
                Some(child) => node = child,
                None => return Some(node),
            }
        }
    }

    /// Trimmed text of the node's full span.
    #[must_use]
    pub fn text_of(&self, node: Node) -> &'s str {
        self.raw_text(node).trim()
    }

    #[must_use]
    pub fn raw_text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

fn spans(node: Node, offset: usize) -> bool {
    node.start_byte() <= offset && offset < node.end_byte()
}

fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
    starts
}

/// Byte span of the node.
#[must_use]
pub fn span(node: Node) -> Range<usize> {
    node.start_byte()..node.end_byte()
}

/// 1-based (line, column) of the node's start; the column is a byte column.
#[must_use]
pub fn location(node: Node) -> (usize, usize) {
    let p = node.start_position();
    (p.row + 1, p.column + 1)
}

#[must_use]
pub fn is_function_like(node: Node) -> bool {
    matches!(
        node.kind(),
        "function_declaration"
            | "function"
            | "function_expression"
            | "arrow_function"
            | "method_definition"
            | "generator_function"
            | "generator_function_declaration"
    )
}

/// Ancestors of `node`, nearest first. Does not include `node` itself.
pub fn ancestors<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    std::iter::successors(node.parent(), |n| n.parent())
}

/// `node` followed by its ancestors.
pub fn self_and_ancestors<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    std::iter::successors(Some(node), |n| n.parent())
}

/// Walks ancestors until a function-like node is found.
#[must_use]
pub fn enclosing_function(node: Node) -> Option<Node> {
    ancestors(node).find(|n| is_function_like(*n))
}

/// Outermost function-like ancestor of `node`.
#[must_use]
pub fn outermost_function(node: Node) -> Option<Node> {
    ancestors(node).filter(|n| is_function_like(*n)).last()
}

/// True when a syntax error sits in `node`, under one of its `ERROR`
/// ancestors, or anywhere in its outermost enclosing function.
#[must_use]
pub fn in_malformed_region(node: Node) -> bool {
    node.has_error()
        || ancestors(node).any(|n| n.kind() == "ERROR")
        || outermost_function(node).is_some_and(|f| f.has_error())
}

/// Visits `root` and its descendants in document order. The children of a
/// node are skipped when `visit` returns false for it.
pub fn walk<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>) -> bool) {
    let mut cursor = root.walk();
    loop {
        let enter = visit(cursor.node());
        if enter && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Walks the body of `root` without descending into nested functions.
pub fn walk_scope<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    walk(root, |node| {
        if node != root && is_function_like(node) {
            return false;
        }
        visit(node);
        true
    });
}

/// Strips parentheses and type-only wrappers around an expression.
#[must_use]
pub fn unwrap_expression(mut node: Node) -> Node {
    while is_transparent(node.kind()) {
        match first_named_child(node) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Wrappers that do not change the runtime value of the expression inside.
#[must_use]
pub fn is_transparent(kind: &str) -> bool {
    matches!(
        kind,
        "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression"
            | "type_assertion"
    )
}

/// First named child that is not a comment.
#[must_use]
pub fn first_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment");
    found
}

/// Name of the called function: `f(..)` → `f`, `a.b.f(..)` → `f`.
#[must_use]
pub fn callee_name<'s>(call: Node, src: &'s str) -> Option<&'s str> {
    if call.kind() != "call_expression" {
        return None;
    }
    let func = unwrap_expression(call.child_by_field_name("function")?);
    match func.kind() {
        "identifier" => func.utf8_text(src.as_bytes()).ok(),
        "member_expression" => func
            .child_by_field_name("property")?
            .utf8_text(src.as_bytes())
            .ok(),
        _ => None,
    }
}

/// Receiver of a method call: `window.addEventListener(..)` → `window`.
#[must_use]
pub fn callee_object<'s>(call: Node, src: &'s str) -> Option<&'s str> {
    let func = unwrap_expression(call.child_by_field_name("function")?);
    if func.kind() != "member_expression" {
        return None;
    }
    func.child_by_field_name("object")?
        .utf8_text(src.as_bytes())
        .ok()
}

/// Constructor name of a `new` expression: `new window.WebSocket(..)` → `WebSocket`.
#[must_use]
pub fn constructor_name<'s>(new_expr: Node, src: &'s str) -> Option<&'s str> {
    if new_expr.kind() != "new_expression" {
        return None;
    }
    let ctor = new_expr.child_by_field_name("constructor")?;
    match ctor.kind() {
        "identifier" => ctor.utf8_text(src.as_bytes()).ok(),
        "member_expression" => ctor
            .child_by_field_name("property")?
            .utf8_text(src.as_bytes())
            .ok(),
        _ => None,
    }
}

/// Argument expressions of a call or `new` expression, comments excluded.
#[must_use]
pub fn arguments(call: Node) -> Vec<Node> {
    let Some(args) = call.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut cursor = args.walk();
    let found = args
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    found
}

/// Expression returned by a `return` statement, if any.
#[must_use]
pub fn returned_expression(ret: Node) -> Option<Node> {
    if ret.kind() != "return_statement" {
        return None;
    }
    first_named_child(ret)
}

/// Whitespace that starts the line containing `offset`.
#[must_use]
pub fn line_indent(src: &str, offset: usize) -> &str {
    let start = line_start(src, offset);
    let rest = src.get(start..).unwrap_or("");
    let width = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    rest.get(..width).unwrap_or("")
}

/// Byte offset where the line containing `offset` begins.
#[must_use]
pub fn line_start(src: &str, offset: usize) -> usize {
    src.get(..offset)
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |i| i + 1)
}

/// True when only spaces or tabs precede `offset` on its line.
#[must_use]
pub fn starts_line(src: &str, offset: usize) -> bool {
    let start = line_start(src, offset);
    src.get(start..offset)
        .is_some_and(|head| head.chars().all(|c| c == ' ' || c == '\t'))
}
