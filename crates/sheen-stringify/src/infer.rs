//! Formatting for nodes that did not record it.
//!
//! A raw that a node lacks is taken from, in order:
//!
//! 1. the node itself;
//! 2. nothing at all, for `before` of the first node in the root;
//! 3. the nearest previous sibling of the same type that recorded it;
//! 4. the indentation of the enclosing block;
//! 5. the first node in the document that recorded it, re-indented to the
//!    node's depth;
//! 6. [`RawDefaults`].
//!
//! Document-wide lookups are cached for the duration of one stringify call.

use std::collections::HashMap;

use sheen_tree::{Node, NodeId, NodeType, Tree};
use tracing::trace;

use crate::RawDefaults;

/// What a document-wide lookup is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Detect {
    BeforeDecl,
    BeforeComment,
    BeforeRule,
    BeforeClose,
    EmptyBody,
    Colon,
    BeforeOpen,
    CommentLeft,
    CommentRight,
    Indent,
}

impl Detect {
    fn before(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Declaration => Detect::BeforeDecl,
            NodeType::Comment => Detect::BeforeComment,
            _ => Detect::BeforeRule,
        }
    }
}

pub(crate) struct Inference<'a> {
    tree: &'a Tree,
    defaults: &'a RawDefaults,
    /// Topmost node of the subtree being printed.
    top: NodeId,
    detected: HashMap<Detect, Option<String>>,
    detected_semicolon: Option<Option<bool>>,
}

impl<'a> Inference<'a> {
    pub(crate) fn new(tree: &'a Tree, defaults: &'a RawDefaults, top: NodeId) -> Self {
        Self {
            tree,
            defaults,
            top,
            detected: HashMap::new(),
            detected_semicolon: None,
        }
    }

    pub(crate) fn before(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        let node = &tree[id];
        if let Some(before) = &node.raws.before {
            return before.clone();
        }
        let Some(parent) = node.parent() else {
            return String::new();
        };
        if self.is_first_of_root(id) {
            return inferred(id, "before", "first in root", String::new());
        }
        let from_sibling = self.sibling(id, |s| {
            if self.is_first_of_root(s) {
                return None;
            }
            tree[s].raws.before.as_deref().map(whitespace)
        });
        if let Some(found) = from_sibling {
            return inferred(id, "before", "sibling", found);
        }
        if let Some(indent) = line_indent(&tree[parent]) {
            let value = format!("\n{indent}{}", self.indent());
            return inferred(id, "before", "parent", value);
        }
        let depth = tree.depth(id);
        match self.detect(Detect::before(node.node_type())) {
            Some(found) => inferred(id, "before", "document", self.reindent(found, depth)),
            None => inferred(id, "before", "default", self.reindent("\n".into(), depth)),
        }
    }

    /// Text between a container's last child and its `}`.
    pub(crate) fn after(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        let node = &tree[id];
        if let Some(after) = &node.raws.after {
            return after.clone();
        }
        if node.node_type() == NodeType::Root {
            return String::new();
        }

        if node.children().is_empty() {
            let from_sibling = self.sibling(id, |s| {
                let sibling = &tree[s];
                if sibling.has_block() && sibling.children().is_empty() {
                    sibling.raws.after.clone()
                } else {
                    None
                }
            });
            if let Some(found) = from_sibling {
                return inferred(id, "after", "sibling", found);
            }
            return match self.detect(Detect::EmptyBody) {
                Some(found) => inferred(id, "after", "document", found),
                None => inferred(id, "after", "default", self.defaults.empty_body.clone()),
            };
        }

        let from_sibling = self.sibling(id, |s| {
            let sibling = &tree[s];
            if sibling.children().is_empty() {
                return None;
            }
            sibling.raws.after.as_deref().map(whitespace)
        });
        if let Some(found) = from_sibling {
            return inferred(id, "after", "sibling", found);
        }
        if let Some(indent) = line_indent(node) {
            return inferred(id, "after", "parent", format!("\n{indent}"));
        }
        let depth = tree.depth(id);
        match self.detect(Detect::BeforeClose) {
            Some(found) => inferred(id, "after", "document", self.reindent(found, depth)),
            None => inferred(id, "after", "default", self.reindent("\n".into(), depth)),
        }
    }

    pub(crate) fn between(&mut self, id: NodeId) -> String {
        let tree = self.tree;
        let node = &tree[id];
        if let Some(between) = &node.raws.between {
            return between.clone();
        }
        match node.node_type() {
            NodeType::Root | NodeType::Comment => String::new(),
            NodeType::Declaration => {
                if let Some(found) = self.sibling(id, |s| tree[s].raws.between.as_deref().map(colon)) {
                    return inferred(id, "between", "sibling", found);
                }
                match self.detect(Detect::Colon) {
                    Some(found) => inferred(id, "between", "document", found),
                    None => inferred(id, "between", "default", self.defaults.colon.clone()),
                }
            }
            // `@import x;` keeps nothing before its `;` unless it recorded it.
            _ if !node.has_block() => String::new(),
            _ => {
                let from_sibling = self.sibling(id, |s| {
                    let sibling = &tree[s];
                    if !sibling.has_block() {
                        return None;
                    }
                    sibling.raws.between.as_deref().map(whitespace)
                });
                if let Some(found) = from_sibling {
                    return inferred(id, "between", "sibling", found);
                }
                match self.detect(Detect::BeforeOpen) {
                    Some(found) => inferred(id, "between", "document", found),
                    None => inferred(id, "between", "default", self.defaults.before_open.clone()),
                }
            }
        }
    }

    /// Whether the last declaration of a container ends with `;`.
    pub(crate) fn semicolon(&mut self, id: NodeId) -> bool {
        let tree = self.tree;
        let node = &tree[id];
        if let Some(semicolon) = node.raws.semicolon {
            return semicolon;
        }
        if node.node_type() != NodeType::Root {
            let from_sibling = self.sibling(id, |s| {
                let sibling = &tree[s];
                if ends_with_decl(tree, sibling) {
                    sibling.raws.semicolon
                } else {
                    None
                }
            });
            if let Some(found) = from_sibling {
                trace!(node = %id, found, "inferred semicolon from sibling");
                return found;
            }
            if let Some(found) = self.detect_semicolon() {
                trace!(node = %id, found, "inferred semicolon from document");
                return found;
            }
        }
        self.defaults.semicolon
    }

    pub(crate) fn comment_left(&mut self, id: NodeId) -> String {
        self.comment_side(id, Detect::CommentLeft)
    }

    pub(crate) fn comment_right(&mut self, id: NodeId) -> String {
        self.comment_side(id, Detect::CommentRight)
    }

    fn comment_side(&mut self, id: NodeId, side: Detect) -> String {
        let tree = self.tree;
        let pick = |node: &Node| match side {
            Detect::CommentLeft => node.raws.left.clone(),
            _ => node.raws.right.clone(),
        };
        let key = match side {
            Detect::CommentLeft => "left",
            _ => "right",
        };
        if let Some(own) = pick(&tree[id]) {
            return own;
        }
        if let Some(found) = self.sibling(id, |s| pick(&tree[s]).map(|raw| whitespace(&raw))) {
            return inferred(id, key, "sibling", found);
        }
        match self.detect(side) {
            Some(found) => inferred(id, key, "document", found),
            None => {
                let default = match side {
                    Detect::CommentLeft => &self.defaults.comment_left,
                    _ => &self.defaults.comment_right,
                };
                inferred(id, key, "default", default.clone())
            }
        }
    }

    /// One level of indentation, as the document uses it.
    pub(crate) fn indent(&mut self) -> String {
        self.detect(Detect::Indent)
            .unwrap_or_else(|| self.defaults.indent.clone())
    }

    fn is_first_of_root(&self, id: NodeId) -> bool {
        let tree = self.tree;
        tree.parent(id)
            .is_some_and(|p| tree[p].node_type() == NodeType::Root && tree.first(p) == Some(id))
    }

    /// The first answer `pick` gives for a previous sibling of the same type,
    /// nearest first.
    fn sibling<T>(&self, id: NodeId, pick: impl Fn(NodeId) -> Option<T>) -> Option<T> {
        let tree = self.tree;
        let parent = tree.parent(id)?;
        let index = tree.index_of(id)?;
        let node_type = tree[id].node_type();
        tree.children(parent)[..index]
            .iter()
            .rev()
            .filter(|&&s| tree[s].node_type() == node_type)
            .find_map(|&s| pick(s))
    }

    /// Replace the indentation after the last newline with `depth` levels.
    fn reindent(&mut self, mut value: String, depth: usize) -> String {
        if let Some(newline) = value.rfind('\n') {
            value.truncate(newline + 1);
            value.push_str(&self.indent().repeat(depth));
        }
        value
    }

    fn detect(&mut self, what: Detect) -> Option<String> {
        if let Some(found) = self.detected.get(&what) {
            return found.clone();
        }
        let found = self.scan(what);
        trace!(?what, ?found, "detected document style");
        self.detected.insert(what, found.clone());
        found
    }

    fn scan(&self, what: Detect) -> Option<String> {
        let tree = self.tree;
        tree.walk(self.top).find_map(|id| {
            let node = &tree[id];
            let raws = &node.raws;
            let node_type = node.node_type();
            match what {
                Detect::BeforeDecl | Detect::BeforeComment | Detect::BeforeRule => {
                    if Detect::before(node_type) != what || self.is_first_of_root(id) {
                        return None;
                    }
                    raws.before.as_deref().map(newline_part)
                }
                Detect::BeforeClose if !node.children().is_empty() => {
                    raws.after.as_deref().map(newline_part)
                }
                Detect::EmptyBody if node.has_block() && node.children().is_empty() => {
                    raws.after.clone()
                }
                Detect::Colon if node_type == NodeType::Declaration => {
                    raws.between.as_deref().map(colon)
                }
                Detect::BeforeOpen if node.has_block() => raws.between.as_deref().map(whitespace),
                Detect::CommentLeft if node_type == NodeType::Comment => {
                    raws.left.as_deref().map(whitespace)
                }
                Detect::CommentRight if node_type == NodeType::Comment => {
                    raws.right.as_deref().map(whitespace)
                }
                Detect::Indent if tree.depth(id) == 1 => {
                    let before = raws.before.as_deref()?;
                    let newline = before.rfind('\n')?;
                    Some(whitespace(&before[newline + 1..]))
                }
                _ => None,
            }
        })
    }

    fn detect_semicolon(&mut self) -> Option<bool> {
        if let Some(found) = self.detected_semicolon {
            return found;
        }
        let tree = self.tree;
        let found = tree
            .walk(self.top)
            .map(|id| &tree[id])
            .filter(|node| ends_with_decl(tree, node))
            .find_map(|node| node.raws.semicolon);
        self.detected_semicolon = Some(found);
        found
    }
}

fn inferred(id: NodeId, key: &'static str, how: &'static str, value: String) -> String {
    trace!(node = %id, key, how, ?value, "inferred raw");
    value
}

fn ends_with_decl(tree: &Tree, node: &Node) -> bool {
    node.children()
        .last()
        .is_some_and(|&last| tree[last].node_type() == NodeType::Declaration)
}

fn whitespace(text: &str) -> String {
    text.chars().filter(|c| c.is_whitespace()).collect()
}

/// Whitespace of `text`, cut after its last newline if it has one.
fn newline_part(text: &str) -> String {
    let mut value = whitespace(text);
    if let Some(newline) = value.rfind('\n') {
        value.truncate(newline + 1);
    }
    value
}

fn colon(text: &str) -> String {
    text.chars()
        .filter(|&c| c.is_whitespace() || c == ':')
        .collect()
}

/// Indentation of the line a node starts on, when its recorded `before`
/// shows it.
fn line_indent(node: &Node) -> Option<String> {
    let before = node.raws.before.as_deref()?;
    let newline = before.rfind('\n')?;
    Some(whitespace(&before[newline + 1..]))
}
