use crate::tree::{NodeId, Tree};

/// Pre-order iterator over the descendants of a node.
///
/// The walk borrows the tree, so it sees a consistent snapshot. To mutate
/// while walking, collect the ids first.
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(tree: &'a Tree, start: NodeId) -> Self {
        let stack = tree.children(start).iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
