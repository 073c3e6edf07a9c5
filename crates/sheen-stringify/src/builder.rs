//! Output sinks for the stringifier.

use sheen_tree::{NodeId, Position, Tree};

/// Which end of a container a fragment opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Start,
    End,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::Start => f.write_str("start"),
            Boundary::End => f.write_str("end"),
        }
    }
}

/// Receives output fragments in order.
///
/// Every fragment a node renders is pushed with that node's id. Whitespace
/// between nodes is pushed with `node = None`. A container pushes exactly
/// one `Start` fragment before its children and one `End` fragment after
/// them; a leaf pushes one fragment with no boundary.
pub trait Builder {
    fn push(&mut self, text: &str, node: Option<NodeId>, boundary: Option<Boundary>);
}

impl<F> Builder for F
where
    F: FnMut(&str, Option<NodeId>, Option<Boundary>),
{
    fn push(&mut self, text: &str, node: Option<NodeId>, boundary: Option<Boundary>) {
        self(text, node, boundary)
    }
}

/// One attributed fragment of generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Where the fragment starts in the output.
    pub generated: Position,
    pub node: NodeId,
    pub boundary: Option<Boundary>,
    /// Where the node was parsed from: its end for an `End` fragment, its
    /// start otherwise. `None` for synthesized nodes.
    pub original: Option<Position>,
}

/// A [`Builder`] that assembles the output and records an [`Attribution`]
/// for every fragment tied to a node.
///
/// The attributions carry everything a source map needs; encoding them is
/// left to the caller.
#[derive(Debug)]
pub struct MappingBuilder<'t> {
    tree: &'t Tree,
    css: String,
    cursor: Position,
    attributions: Vec<Attribution>,
}

impl<'t> MappingBuilder<'t> {
    pub fn new(tree: &'t Tree) -> Self {
        Self {
            tree,
            css: String::new(),
            cursor: Position::START,
            attributions: Vec::new(),
        }
    }

    /// The output so far.
    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn attributions(&self) -> &[Attribution] {
        &self.attributions
    }

    pub fn finish(self) -> (String, Vec<Attribution>) {
        (self.css, self.attributions)
    }

    fn advance(&mut self, text: &str) {
        for c in text.chars() {
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
        self.cursor.offset += text.len() as u32;
    }
}

impl Builder for MappingBuilder<'_> {
    fn push(&mut self, text: &str, node: Option<NodeId>, boundary: Option<Boundary>) {
        if let Some(node) = node {
            let original = self.tree[node].source.as_ref().map(|source| match boundary {
                Some(Boundary::End) => source.end.unwrap_or(source.start),
                _ => source.start,
            });
            self.attributions.push(Attribution {
                generated: self.cursor,
                node,
                boundary,
                original,
            });
        }
        self.css.push_str(text);
        self.advance(text);
    }
}
