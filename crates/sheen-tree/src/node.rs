//! Node kinds and per-node data.

use std::sync::Arc;

use crate::input::{Input, Position};
use crate::raws::Raws;
use crate::tree::{NodeId, TreeError};

/// Plain tag of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    AtRule,
    Rule,
    Declaration,
    Comment,
    /// A kind contributed by a dialect; see [`NodeKind::Other`].
    Other,
}

impl NodeType {
    /// Short lowercase name, as used in JSON dumps and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Root => "root",
            NodeType::AtRule => "atrule",
            NodeType::Rule => "rule",
            NodeType::Declaration => "decl",
            NodeType::Comment => "comment",
            NodeType::Other => "other",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node's kind together with its semantic properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    /// `@name params;` or `@name params { ... }`
    AtRule { name: String, params: String },
    /// `selector { ... }`
    Rule { selector: String },
    /// `prop: value` with an optional `!important`
    Declaration {
        prop: String,
        value: String,
        important: bool,
    },
    /// `/* text */`
    Comment { text: String },
    /// A dialect node. `name` selects a registered renderer; `head` and
    /// `value` are what the generic rendering prints.
    Other {
        name: String,
        head: String,
        value: String,
    },
}

impl NodeKind {
    pub fn at_rule(name: impl Into<String>, params: impl Into<String>) -> Self {
        NodeKind::AtRule {
            name: name.into(),
            params: params.into(),
        }
    }

    pub fn rule(selector: impl Into<String>) -> Self {
        NodeKind::Rule {
            selector: selector.into(),
        }
    }

    pub fn decl(prop: impl Into<String>, value: impl Into<String>) -> Self {
        NodeKind::Declaration {
            prop: prop.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        NodeKind::Comment { text: text.into() }
    }

    pub fn other(name: impl Into<String>, head: impl Into<String>, value: impl Into<String>) -> Self {
        NodeKind::Other {
            name: name.into(),
            head: head.into(),
            value: value.into(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Root => NodeType::Root,
            NodeKind::AtRule { .. } => NodeType::AtRule,
            NodeKind::Rule { .. } => NodeType::Rule,
            NodeKind::Declaration { .. } => NodeType::Declaration,
            NodeKind::Comment { .. } => NodeType::Comment,
            NodeKind::Other { .. } => NodeType::Other,
        }
    }
}

/// Where a node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub input: Arc<Input>,
    pub start: Position,
    /// Unset while the parser has not reached the node's end.
    pub end: Option<Position>,
}

/// One node of a [`Tree`](crate::Tree).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    /// `Some` when the node has a block, even an empty one.
    pub(crate) children: Option<Vec<NodeId>>,
    /// Where the node was parsed from; `None` for synthesized nodes.
    pub source: Option<Source>,
    pub raws: Raws,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        let children = match kind {
            NodeKind::Root | NodeKind::Rule { .. } => Some(Vec::new()),
            _ => None,
        };
        Self {
            kind,
            parent: None,
            children,
            source: None,
            raws: Raws::default(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Direct access to the semantic properties.
    ///
    /// Unlike the setters this leaves raw caches alone; callers that change
    /// a cached property are responsible for the matching raw.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// The containing node, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in document order; empty for leaves.
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Whether the node has a block (`{ ... }`), even an empty one.
    pub fn has_block(&self) -> bool {
        self.children.is_some()
    }

    /// Whether children may be inserted into this node.
    pub fn can_contain(&self) -> bool {
        !matches!(
            self.kind,
            NodeKind::Declaration { .. } | NodeKind::Comment { .. }
        )
    }

    pub fn selector(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Rule { selector } => Some(selector),
            _ => None,
        }
    }

    pub fn prop(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Declaration { prop, .. } => Some(prop),
            _ => None,
        }
    }

    /// Declaration value, or the value of a dialect node.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Declaration { value, .. } | NodeKind::Other { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn important(&self) -> bool {
        matches!(self.kind, NodeKind::Declaration { important: true, .. })
    }

    /// At-rule name (without `@`), or the kind name of a dialect node.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::AtRule { name, .. } | NodeKind::Other { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn params(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::AtRule { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Comment { text } => Some(text),
            _ => None,
        }
    }

    pub fn head(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Other { head, .. } => Some(head),
            _ => None,
        }
    }

    fn mismatch(&self, expected: &'static str) -> TreeError {
        TreeError::KindMismatch {
            expected,
            found: self.node_type(),
        }
    }

    /// Replace a rule's selector; drops the cached raw selector.
    pub fn set_selector(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::Rule { selector } => {
                *selector = new.into();
                self.raws.selector = None;
                Ok(())
            }
            _ => Err(self.mismatch("rule")),
        }
    }

    pub fn set_prop(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::Declaration { prop, .. } => {
                *prop = new.into();
                Ok(())
            }
            _ => Err(self.mismatch("decl")),
        }
    }

    /// Replace a declaration's (or dialect node's) value; drops the cached
    /// raw value.
    pub fn set_value(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::Declaration { value, .. } | NodeKind::Other { value, .. } => {
                *value = new.into();
                self.raws.value = None;
                Ok(())
            }
            _ => Err(self.mismatch("decl")),
        }
    }

    /// Toggle `!important`. Turning it off drops any custom spelling.
    pub fn set_important(&mut self, on: bool) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::Declaration { important, .. } => {
                *important = on;
                if !on {
                    self.raws.important = None;
                }
                Ok(())
            }
            _ => Err(self.mismatch("decl")),
        }
    }

    pub fn set_name(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::AtRule { name, .. } | NodeKind::Other { name, .. } => {
                *name = new.into();
                Ok(())
            }
            _ => Err(self.mismatch("atrule")),
        }
    }

    /// Replace an at-rule's params; drops the cached raw params.
    pub fn set_params(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::AtRule { params, .. } => {
                *params = new.into();
                self.raws.params = None;
                Ok(())
            }
            _ => Err(self.mismatch("atrule")),
        }
    }

    pub fn set_text(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::Comment { text } => {
                *text = new.into();
                Ok(())
            }
            _ => Err(self.mismatch("comment")),
        }
    }

    pub fn set_head(&mut self, new: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.kind {
            NodeKind::Other { head, .. } => {
                *head = new.into();
                Ok(())
            }
            _ => Err(self.mismatch("other")),
        }
    }

    /// Cached raw forms that no longer match their semantic property.
    pub(crate) fn stale_raws(&self) -> Vec<&'static str> {
        let mut stale = Vec::new();
        match &self.kind {
            NodeKind::Rule { selector } => {
                if self.raws.selector.as_ref().is_some_and(|r| &r.value != selector) {
                    stale.push("selector.raw");
                }
            }
            NodeKind::Declaration { value, .. } | NodeKind::Other { value, .. } => {
                if self.raws.value.as_ref().is_some_and(|r| &r.value != value) {
                    stale.push("value.raw");
                }
            }
            NodeKind::AtRule { params, .. } => {
                if self.raws.params.as_ref().is_some_and(|r| &r.value != params) {
                    stale.push("params.raw");
                }
            }
            NodeKind::Root | NodeKind::Comment { .. } => {}
        }
        stale
    }
}
