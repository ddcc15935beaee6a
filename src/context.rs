// src/context.rs
//! Context analyzer: read-only questions about where a construct lives.
//!
//! Every fix generator asks the same things of a node: is it bound to a
//! name, does it run inside an effect block, is the enclosing function a UI
//! component, and does that scope already return a cleanup callback.

use crate::syntax::{
    ancestors, arguments, callee_name, first_named_child, is_function_like, is_transparent,
    returned_expression, self_and_ancestors, unwrap_expression, walk_scope,
};
use tree_sitter::Node;

/// Hook names that run their callback after render and accept a cleanup return.
pub const EFFECT_HOOKS: &[&str] = &["useEffect", "useLayoutEffect", "useInsertionEffect"];

/// An effect-block call together with its callback function.
#[derive(Debug, Clone, Copy)]
pub struct EffectBlock<'t> {
    pub call: Node<'t>,
    pub callback: Node<'t>,
}

pub struct ContextAnalyzer<'s> {
    src: &'s str,
}

impl<'s> ContextAnalyzer<'s> {
    #[must_use]
    pub fn new(src: &'s str) -> Self {
        Self { src }
    }

    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.src.as_bytes()).unwrap_or("")
    }

    /// Name the value of `node` is bound to, through either a variable
    /// declarator or a simple assignment whose right-hand side is `node`.
    #[must_use]
    pub fn extract_bound_name(&self, node: Node) -> Option<String> {
        let mut current = node;
        loop {
            let parent = current.parent()?;
            match parent.kind() {
                kind if is_transparent(kind) => current = parent,
                "variable_declarator" => {
                    if parent.child_by_field_name("value")? != current {
                        return None;
                    }
                    let name = parent.child_by_field_name("name")?;
                    return (name.kind() == "identifier").then(|| self.text(name).to_string());
                }
                "assignment_expression" => {
                    if parent.child_by_field_name("right")? != current {
                        return None;
                    }
                    let left = parent.child_by_field_name("left")?;
                    return matches!(left.kind(), "identifier" | "member_expression")
                        .then(|| self.text(left).to_string());
                }
                _ => return None,
            }
        }
    }

    /// True when `node`'s value leaves the expression through a return,
    /// either a `return` statement or an arrow's expression body.
    #[must_use]
    pub fn is_returned(&self, node: Node) -> bool {
        let mut current = node;
        while let Some(parent) = current.parent() {
            if is_transparent(parent.kind()) {
                current = parent;
                continue;
            }
            return match parent.kind() {
                "return_statement" => true,
                "arrow_function" => parent.child_by_field_name("body") == Some(current),
                _ => false,
            };
        }
        false
    }

    /// Call to one of the effect hooks, bare or through a namespace (`React.useEffect`).
    #[must_use]
    pub fn is_effect_call(&self, node: Node) -> bool {
        callee_name(node, self.src).is_some_and(|name| EFFECT_HOOKS.contains(&name))
    }

    /// First argument of an effect call when it is a function.
    #[must_use]
    pub fn effect_callback<'t>(&self, call: Node<'t>) -> Option<Node<'t>> {
        if !self.is_effect_call(call) {
            return None;
        }
        arguments(call)
            .into_iter()
            .next()
            .map(unwrap_expression)
            .filter(|arg| is_function_like(*arg))
    }

    /// Nearest effect block whose callback contains `node`.
    #[must_use]
    pub fn effect_block_of<'t>(&self, node: Node<'t>) -> Option<EffectBlock<'t>> {
        self_and_ancestors(node).find_map(|call| {
            let callback = self.effect_callback(call)?;
            contains(callback, node).then_some(EffectBlock { call, callback })
        })
    }

    /// Walks ancestors from `func` outward looking for a call to the effect API.
    #[must_use]
    pub fn is_inside_effect_block(&self, func: Node) -> bool {
        self_and_ancestors(func).any(|n| self.is_effect_call(n))
    }

    /// Best-effort heuristic: the declared name starts with an uppercase letter,
    /// or the body returns a markup value. Either clause is sufficient.
    #[must_use]
    pub fn is_component_function(&self, func: Node) -> bool {
        let capitalized = self
            .function_name(func)
            .and_then(|name| name.chars().next())
            .is_some_and(char::is_uppercase);
        capitalized || self.returns_markup(func)
    }

    /// Declared name of a function, looking through `const X = memo(() => ..)` style wrappers.
    #[must_use]
    pub fn function_name(&self, func: Node) -> Option<&'s str> {
        if let Some(name) = func.child_by_field_name("name") {
            return Some(self.text(name));
        }
        let mut current = func;
        while let Some(parent) = current.parent() {
            match parent.kind() {
                "variable_declarator" | "pair" | "public_field_definition" => {
                    let field = if parent.kind() == "pair" { "key" } else { "name" };
                    let name = parent.child_by_field_name(field)?;
                    return Some(self.text(name));
                }
                "arguments" | "call_expression" => current = parent,
                kind if is_transparent(kind) => current = parent,
                _ => return None,
            }
        }
        None
    }

    /// True when the function returns a markup value (JSX), explicitly or as an arrow body.
    #[must_use]
    pub fn returns_markup(&self, func: Node) -> bool {
        let Some(body) = func.child_by_field_name("body") else {
            return false;
        };
        if body.kind() != "statement_block" {
            return is_markup(unwrap_expression(body));
        }
        let mut found = false;
        walk_scope(body, |node| {
            if !found {
                found = returned_expression(node).is_some_and(|e| is_markup(unwrap_expression(e)));
            }
        });
        found
    }

    /// True when the function body returns a function (the cleanup callback).
    #[must_use]
    pub fn has_existing_cleanup(&self, func: Node) -> bool {
        self.cleanup_callback(func).is_some()
    }

    /// The first function returned from `func`'s body.
    #[must_use]
    pub fn cleanup_callback<'t>(&self, func: Node<'t>) -> Option<Node<'t>> {
        let body = func.child_by_field_name("body")?;
        if body.kind() != "statement_block" {
            let expr = unwrap_expression(body);
            return is_function_like(expr).then_some(expr);
        }
        let mut cleanup = None;
        walk_scope(body, |node| {
            if cleanup.is_some() {
                return;
            }
            cleanup = returned_expression(node)
                .map(unwrap_expression)
                .filter(|e| is_function_like(*e));
        });
        cleanup
    }
}

fn is_markup(node: Node) -> bool {
    matches!(
        node.kind(),
        "jsx_element" | "jsx_self_closing_element" | "jsx_fragment"
    )
}

/// True when `inner` lies within `outer`'s span.
#[must_use]
pub fn contains(outer: Node, inner: Node) -> bool {
    outer.start_byte() <= inner.start_byte() && inner.end_byte() <= outer.end_byte()
}

/// Statement that holds `node`, stopping at function boundaries.
#[must_use]
pub fn enclosing_statement(node: Node) -> Option<Node> {
    for current in self_and_ancestors(node) {
        if current != node && is_function_like(current) {
            return None;
        }
        if is_statement(current) {
            return Some(current);
        }
    }
    None
}

/// Expression statement consisting of `node` alone (modulo parentheses).
#[must_use]
pub fn standalone_statement(node: Node) -> Option<Node> {
    ancestors(node)
        .find(|p| !is_transparent(p.kind()))
        .filter(|p| p.kind() == "expression_statement")
        .filter(|stmt| first_named_child(*stmt).map(unwrap_expression) == Some(node))
}

fn is_statement(node: Node) -> bool {
    let kind = node.kind();
    kind.ends_with("_statement") || kind == "lexical_declaration" || kind == "variable_declaration"
}
