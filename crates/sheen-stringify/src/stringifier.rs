//! Tree to text.

use std::collections::HashMap;
use std::sync::Arc;

use sheen_tree::{NodeId, NodeKind, NodeType, RawValue, Tree};
use tracing::{debug, trace};

use crate::builder::{Boundary, Builder};
use crate::error::StringifyError;
use crate::infer::Inference;
use crate::options::RawDefaults;

/// Renders dialect nodes ([`NodeKind::Other`]) of one registered name.
///
/// The renderer prints the node itself; the whitespace before it has
/// already been pushed. `semicolon` says whether the node is expected to
/// end with `;`.
pub trait NodeRenderer: Send + Sync {
    fn render(
        &self,
        cx: &mut RenderContext<'_, '_>,
        id: NodeId,
        semicolon: bool,
    ) -> Result<(), StringifyError>;
}

impl<F> NodeRenderer for F
where
    F: Fn(&mut RenderContext<'_, '_>, NodeId, bool) -> Result<(), StringifyError> + Send + Sync,
{
    fn render(
        &self,
        cx: &mut RenderContext<'_, '_>,
        id: NodeId,
        semicolon: bool,
    ) -> Result<(), StringifyError> {
        self(cx, id, semicolon)
    }
}

/// Turns a [`Tree`] back into text.
///
/// Raws a node recorded are printed as they are; missing ones are inferred
/// from the rest of the document (see [`RawDefaults`] for the last resort).
/// An unmodified parsed tree prints back to its input byte for byte.
#[derive(Clone, Default)]
pub struct Stringifier {
    strict: bool,
    defaults: RawDefaults,
    renderers: HashMap<String, Arc<dyn NodeRenderer>>,
}

impl std::fmt::Debug for Stringifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut renderers: Vec<_> = self.renderers.keys().collect();
        renderers.sort();
        f.debug_struct("Stringifier")
            .field("strict", &self.strict)
            .field("defaults", &self.defaults)
            .field("renderers", &renderers)
            .finish()
    }
}

impl Stringifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on dialect nodes without a renderer instead of printing them
    /// generically.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Indentation unit used when the document shows none.
    pub fn indent(mut self, unit: impl Into<String>) -> Self {
        self.defaults.indent = unit.into();
        self
    }

    pub fn defaults(mut self, defaults: RawDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Render dialect nodes named `name` with `renderer`.
    pub fn register(mut self, name: impl Into<String>, renderer: impl NodeRenderer + 'static) -> Self {
        self.renderers.insert(name.into(), Arc::new(renderer));
        self
    }

    /// Print the whole document into `builder`.
    pub fn stringify(&self, tree: &Tree, builder: &mut dyn Builder) -> Result<(), StringifyError> {
        self.stringify_node(tree, tree.root(), builder)
    }

    /// Print one node and its descendants, without the whitespace before it.
    pub fn stringify_node(
        &self,
        tree: &Tree,
        id: NodeId,
        builder: &mut dyn Builder,
    ) -> Result<(), StringifyError> {
        let top = tree.ancestors(id).last().unwrap_or(id);
        let mut cx = RenderContext {
            stringifier: self,
            tree,
            raws: Inference::new(tree, &self.defaults, top),
            builder,
        };
        cx.node(id, false)
    }

    /// Print the whole document to a string.
    pub fn to_string(&self, tree: &Tree) -> Result<String, StringifyError> {
        let mut out = String::new();
        self.stringify(tree, &mut |text: &str, _: Option<NodeId>, _: Option<Boundary>| {
            out.push_str(text)
        })?;
        Ok(out)
    }
}

/// State of one stringify call, handed to [`NodeRenderer`]s.
pub struct RenderContext<'a, 'b> {
    stringifier: &'a Stringifier,
    tree: &'a Tree,
    raws: Inference<'a>,
    builder: &'b mut dyn Builder,
}

impl<'a> RenderContext<'a, '_> {
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    pub fn push(&mut self, text: &str, node: Option<NodeId>, boundary: Option<Boundary>) {
        self.builder.push(text, node, boundary);
    }

    /// The node's `before` raw, recorded or inferred.
    pub fn before(&mut self, id: NodeId) -> String {
        self.raws.before(id)
    }

    pub fn between(&mut self, id: NodeId) -> String {
        self.raws.between(id)
    }

    pub fn after(&mut self, id: NodeId) -> String {
        self.raws.after(id)
    }

    pub fn semicolon(&mut self, id: NodeId) -> bool {
        self.raws.semicolon(id)
    }

    /// Print `head + between + "{"`, the children, then `after + "}"`.
    pub fn block(&mut self, id: NodeId, head: &str) -> Result<(), StringifyError> {
        let between = self.raws.between(id);
        self.push(&format!("{head}{between}{{"), Some(id), Some(Boundary::Start));
        self.body(id)?;
        let after = self.raws.after(id);
        if !after.is_empty() {
            self.push(&after, None, None);
        }
        self.push("}", Some(id), Some(Boundary::End));
        Ok(())
    }

    /// Print the children of `id`, each preceded by its `before`.
    pub fn body(&mut self, id: NodeId) -> Result<(), StringifyError> {
        let tree = self.tree;
        let children = tree.children(id);
        let last = children
            .iter()
            .rposition(|&c| tree[c].node_type() != NodeType::Comment)
            .unwrap_or(0);
        let semicolon = self.raws.semicolon(id);
        for (i, &child) in children.iter().enumerate() {
            let before = self.raws.before(child);
            if !before.is_empty() {
                self.push(&before, None, None);
            }
            self.node(child, i != last || semicolon)?;
        }
        Ok(())
    }

    /// Print a dialect node as `head + between + "{" ... "}"` when it has a
    /// block, or `head + between + value` when it does not.
    pub fn generic(&mut self, id: NodeId, semicolon: bool) -> Result<(), StringifyError> {
        let tree = self.tree;
        let node = &tree[id];
        let head = node.head().unwrap_or_default();
        if node.has_block() {
            return self.block(id, head);
        }
        let value = node
            .value()
            .map(|value| raw_value(node.raws.value.as_ref(), value))
            .unwrap_or_default();
        let mut text = format!("{head}{}{value}", self.raws.between(id));
        if semicolon {
            text.push(';');
        }
        self.push(&text, Some(id), None);
        Ok(())
    }

    fn node(&mut self, id: NodeId, semicolon: bool) -> Result<(), StringifyError> {
        let tree = self.tree;
        let node = &tree[id];
        trace!(node = %id, node_type = %node.node_type(), "stringify");
        match node.kind() {
            NodeKind::Root => {
                self.push("", Some(id), Some(Boundary::Start));
                self.body(id)?;
                if let Some(after) = node.raws.after.as_deref().filter(|a| !a.is_empty()) {
                    self.push(after, None, None);
                }
                self.push("", Some(id), Some(Boundary::End));
            }
            NodeKind::Rule { selector } => {
                self.block(id, raw_value(node.raws.selector.as_ref(), selector))?;
                if let Some(own) = &node.raws.own_semicolon {
                    self.push(own, None, None);
                }
            }
            NodeKind::AtRule { name, params } => {
                let params = raw_value(node.raws.params.as_ref(), params);
                let mut head = format!("@{name}");
                match &node.raws.after_name {
                    Some(after_name) => head.push_str(after_name),
                    None if !params.is_empty() => head.push(' '),
                    None => {}
                }
                head.push_str(params);
                if node.has_block() {
                    self.block(id, &head)?;
                } else {
                    head.push_str(&self.raws.between(id));
                    if semicolon {
                        head.push(';');
                    }
                    self.push(&head, Some(id), None);
                }
            }
            NodeKind::Declaration {
                prop,
                value,
                important,
            } => {
                let between = self.raws.between(id);
                let mut text = format!("{prop}{between}{}", raw_value(node.raws.value.as_ref(), value));
                if *important {
                    text.push_str(node.raws.important.as_deref().unwrap_or(" !important"));
                }
                if semicolon {
                    text.push(';');
                }
                self.push(&text, Some(id), None);
            }
            NodeKind::Comment { text } => {
                let left = self.raws.comment_left(id);
                let right = self.raws.comment_right(id);
                self.push(&format!("/*{left}{text}{right}*/"), Some(id), None);
            }
            NodeKind::Other { name, .. } => {
                let stringifier = self.stringifier;
                if let Some(renderer) = stringifier.renderers.get(name) {
                    return renderer.render(self, id, semicolon);
                }
                if stringifier.strict {
                    return Err(StringifyError::unknown_node_type(tree, id, name));
                }
                debug!(node = %id, name = %name, "no renderer registered, printing generically");
                self.generic(id, semicolon)?;
            }
        }
        Ok(())
    }
}

/// The cached source form of a property, while it still matches.
fn raw_value<'n>(raw: Option<&'n RawValue>, value: &'n str) -> &'n str {
    match raw {
        Some(raw) if raw.value == value => &raw.raw,
        _ => value,
    }
}
