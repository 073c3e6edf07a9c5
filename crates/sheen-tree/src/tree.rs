//! The node arena and structural mutation.

use std::sync::Arc;

use tracing::trace;

use crate::input::{Input, Position};
use crate::node::{Node, NodeKind, NodeType, Source};
use crate::raws::Damage;
use crate::walk::Walk;

/// Index of a node in its [`Tree`].
///
/// Ids are only meaningful for the tree that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a tree was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Malformed input is an error; the tree round-trips exactly.
    #[default]
    Strict,
    /// Malformed input is repaired; the tree is for inspection and its
    /// output is not guaranteed to match the input.
    Tolerant,
}

/// A problem the tolerant parser repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub damage: Damage,
    /// The message strict mode would have failed with.
    pub message: String,
    pub position: Position,
    /// The node that carries the repair, when there is one.
    pub node: Option<NodeId>,
}

/// Invalid structural mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Declarations and comments cannot have children.
    NotAContainer { node: NodeId, node_type: NodeType },
    /// A root cannot become a child.
    CannotInsertRoot,
    /// The node would become its own ancestor.
    WouldCycle { node: NodeId, parent: NodeId },
    IndexOutOfBounds { index: usize, len: usize },
    /// The operation needs an attached node.
    Detached(NodeId),
    /// A property setter was called on the wrong kind of node.
    KindMismatch {
        expected: &'static str,
        found: NodeType,
    },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeError::NotAContainer { node, node_type } => {
                write!(f, "{node_type} node {node} cannot have children")
            }
            TreeError::CannotInsertRoot => write!(f, "a root node cannot be inserted"),
            TreeError::WouldCycle { node, parent } => {
                write!(f, "inserting {node} into {parent} would make it its own ancestor")
            }
            TreeError::IndexOutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for {len} children")
            }
            TreeError::Detached(node) => write!(f, "node {node} has no parent"),
            TreeError::KindMismatch { expected, found } => {
                write!(f, "expected a {expected} node, found {found}")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// Cached raw forms that disagree with their node's semantic property.
///
/// Setters drop these caches, so finding one means something wrote to a
/// node without going through them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInconsistencyError {
    pub stale: Vec<(NodeId, &'static str)>,
}

impl std::fmt::Display for RawInconsistencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stale raw caches:")?;
        for (node, key) in &self.stale {
            write!(f, " {node}.{key}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RawInconsistencyError {}

/// A parsed (or built) document.
///
/// The tree owns every node in an arena; nodes refer to each other through
/// [`NodeId`]s. Removed nodes stay in the arena, detached, and may be
/// inserted again.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    input: Arc<Input>,
    mode: Mode,
    recoveries: Vec<Recovery>,
}

impl Tree {
    /// A tree holding only a root, sourced from `input`.
    pub fn new(input: Arc<Input>) -> Self {
        let mut root = Node::new(NodeKind::Root);
        root.source = Some(Source {
            input: Arc::clone(&input),
            start: Position::START,
            end: None,
        });
        Self {
            nodes: vec![root],
            root: NodeId(0),
            input,
            mode: Mode::Strict,
            recoveries: Vec::new(),
        }
    }

    /// A tree with an empty input, for building documents by hand.
    pub fn empty() -> Self {
        Self::new(Arc::new(Input::new("")))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn input(&self) -> &Arc<Input> {
        &self.input
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Repairs made while parsing, in the order they happened.
    pub fn recoveries(&self) -> &[Recovery] {
        &self.recoveries
    }

    pub fn record_recovery(&mut self, recovery: Recovery) {
        if let Some(node) = recovery.node {
            self.nodes[node.index()].raws.damage.push(recovery.damage);
        }
        self.recoveries.push(recovery);
    }

    /// Whether the tolerant parser had to repair anything.
    pub fn is_recovered(&self) -> bool {
        !self.recoveries.is_empty()
    }

    /// Number of arena slots, detached nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        trace!(?id, kind = %kind.node_type(), "create node");
        self.nodes.push(Node::new(kind));
        id
    }

    /// Give an at-rule or dialect node an empty block.
    pub fn open_block(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node_mut(id);
        if !node.can_contain() {
            return Err(TreeError::NotAContainer {
                node: id,
                node_type: node.node_type(),
            });
        }
        node.children.get_or_insert_with(Vec::new);
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn first(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of `id` among its parent's children.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// The sibling before `id`.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index_of(id)?;
        let parent = self.parent(id)?;
        index.checked_sub(1).map(|i| self.children(parent)[i])
    }

    /// The sibling after `id`.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let index = self.index_of(id)?;
        let parent = self.parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), |&p| self.parent(p))
    }

    /// Number of ancestors that are not the root: top-level nodes are at
    /// depth 0, the declarations of a top-level rule at depth 1.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id)
            .filter(|&a| self.node(a).node_type() != NodeType::Root)
            .count()
    }

    /// Whether `id` is reachable from this tree's root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// Descendants of `id` in document order, `id` itself excluded.
    pub fn walk(&self, id: NodeId) -> Walk<'_> {
        Walk::new(self, id)
    }

    fn walk_type(&self, node_type: NodeType) -> impl Iterator<Item = NodeId> + '_ {
        self.walk(self.root)
            .filter(move |&id| self.node(id).node_type() == node_type)
    }

    pub fn walk_decls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_type(NodeType::Declaration)
    }

    pub fn walk_rules(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_type(NodeType::Rule)
    }

    pub fn walk_at_rules(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_type(NodeType::AtRule)
    }

    pub fn walk_comments(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_type(NodeType::Comment)
    }

    /// Add `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let len = self.children(parent).len();
        let len = if self.parent(child) == Some(parent) {
            len - 1
        } else {
            len
        };
        self.insert(parent, len, child)
    }

    /// Add `child` as the first child of `parent`.
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.insert(parent, 0, child)
    }

    /// Insert `child` right before `sibling`. Inserting a node next to
    /// itself leaves it where it is.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(sibling).ok_or(TreeError::Detached(sibling))?;
        if child == sibling {
            return Ok(());
        }
        self.detach_for(parent, child)?;
        let index = self.index_of(sibling).ok_or(TreeError::Detached(sibling))?;
        self.insert(parent, index, child)
    }

    /// Insert `child` right after `sibling`. Inserting a node next to
    /// itself leaves it where it is.
    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> Result<(), TreeError> {
        let parent = self.parent(sibling).ok_or(TreeError::Detached(sibling))?;
        if child == sibling {
            return Ok(());
        }
        self.detach_for(parent, child)?;
        let index = self.index_of(sibling).ok_or(TreeError::Detached(sibling))?;
        self.insert(parent, index + 1, child)
    }

    /// Detach `child` ahead of an insertion whose index depends on its
    /// siblings; leaves it attached when the move is invalid anyway.
    fn detach_for(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;
        if let Some(old) = self.parent(child) {
            if old != parent {
                self.forget_layout(child, old, parent);
            }
            self.unlink(child);
        }
        Ok(())
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        let node = self.node(parent);
        if !node.can_contain() {
            return Err(TreeError::NotAContainer {
                node: parent,
                node_type: node.node_type(),
            });
        }
        if child == self.root || self.node(child).node_type() == NodeType::Root {
            return Err(TreeError::CannotInsertRoot);
        }
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(TreeError::WouldCycle {
                node: child,
                parent,
            });
        }
        Ok(())
    }

    /// Insert `child` into `parent` at `index`.
    ///
    /// An attached `child` is moved: it is first removed from its current
    /// parent, and `index` is interpreted after that removal. Moving to a
    /// different parent drops the node's indentation raws so they are
    /// inferred from the new surroundings.
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<(), TreeError> {
        self.check_insert(parent, child)?;

        let same_parent = self.parent(child) == Some(parent);
        let len = self.children(parent).len() - usize::from(same_parent);
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }

        if let Some(old) = self.parent(child) {
            if old != parent {
                self.forget_layout(child, old, parent);
            }
            self.unlink(child);
        }

        trace!(?parent, index, ?child, "insert");
        self.nodes[parent.index()]
            .children
            .get_or_insert_with(Vec::new)
            .insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
        Ok(())
    }

    /// Move `child` to `index` within `parent`. Same as [`insert`](Self::insert).
    pub fn move_to(&mut self, child: NodeId, parent: NodeId, index: usize) -> Result<(), TreeError> {
        self.insert(parent, index, child)
    }

    /// Detach `id` from its parent. Detached nodes are left untouched.
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::CannotInsertRoot);
        }
        trace!(?id, "remove");
        self.unlink(id);
        Ok(())
    }

    /// Detach every child of `parent`.
    pub fn remove_all(&mut self, parent: NodeId) {
        let Some(children) = self.nodes[parent.index()].children.as_mut() else {
            return;
        };
        for child in std::mem::take(children) {
            self.nodes[child.index()].parent = None;
        }
    }

    /// Put `new` where `old` is, detaching `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        if old == new {
            return Ok(());
        }
        let parent = self.parent(old).ok_or(TreeError::Detached(old))?;
        self.insert_before(old, new)?;
        self.unlink(old);
        debug_assert!(self.parent(new) == Some(parent));
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.index()].parent.take() else {
            return;
        };
        if let Some(children) = self.nodes[parent.index()].children.as_mut() {
            children.retain(|&c| c != id);
        }
    }

    /// Drop raws that only made sense under the old parent.
    fn forget_layout(&mut self, child: NodeId, old: NodeId, new: NodeId) {
        let node = &mut self.nodes[child.index()].raws;
        node.before = None;
        node.after = None;

        let old_depth = self.depth(old) + usize::from(self.node(old).node_type() != NodeType::Root);
        let new_depth = self.depth(new) + usize::from(self.node(new).node_type() != NodeType::Root);
        if old_depth != new_depth {
            let descendants: Vec<NodeId> = self.walk(child).collect();
            for id in descendants {
                let raws = &mut self.nodes[id.index()].raws;
                raws.before = None;
                raws.after = None;
            }
        }
    }

    /// Deep copy of the subtree at `id`, raws included, as a detached node.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut copy = self.node(id).clone();
        copy.parent = None;
        let children = copy.children.take();
        let new = NodeId(self.nodes.len() as u32);
        self.nodes.push(copy);

        if let Some(children) = children {
            let mut cloned = Vec::with_capacity(children.len());
            for child in children {
                let c = self.clone_subtree(child);
                self.nodes[c.index()].parent = Some(new);
                cloned.push(c);
            }
            self.nodes[new.index()].children = Some(cloned);
        }
        new
    }

    /// Drop formatting raws in the subtree at `id` so the stringifier infers
    /// them again. `keep_between` preserves `between`.
    pub fn clean_raws(&mut self, id: NodeId, keep_between: bool) {
        let ids: Vec<NodeId> = std::iter::once(id).chain(self.walk(id)).collect();
        for id in ids {
            let raws = &mut self.nodes[id.index()].raws;
            raws.before = None;
            raws.after = None;
            if !keep_between {
                raws.between = None;
            }
        }
    }

    /// Check that no attached node carries a raw cache for a value it no
    /// longer has.
    pub fn check_raws(&self) -> Result<(), RawInconsistencyError> {
        let stale: Vec<(NodeId, &'static str)> = std::iter::once(self.root)
            .chain(self.walk(self.root))
            .flat_map(|id| self.node(id).stale_raws().into_iter().map(move |key| (id, key)))
            .collect();
        if stale.is_empty() {
            Ok(())
        } else {
            Err(RawInconsistencyError { stale })
        }
    }
}

impl std::ops::Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
    }
}

impl std::ops::IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_mut(id)
    }
}
