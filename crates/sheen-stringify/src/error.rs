use sheen_tree::{NodeId, Position, Tree};

/// Errors from stringification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringifyError {
    /// A dialect node with no registered renderer, in strict mode.
    UnknownNodeType {
        kind: String,
        node: NodeId,
        /// Where the node was parsed from, if it was.
        position: Option<Position>,
        from: Option<String>,
    },
}

impl StringifyError {
    pub(crate) fn unknown_node_type(tree: &Tree, node: NodeId, kind: &str) -> Self {
        let source = tree[node].source.as_ref();
        StringifyError::UnknownNodeType {
            kind: kind.to_string(),
            node,
            position: source.map(|s| s.start),
            from: source.and_then(|s| s.input.from().map(str::to_owned)),
        }
    }
}

impl std::fmt::Display for StringifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StringifyError::UnknownNodeType {
                kind,
                node,
                position: Some(position),
                from,
            } => write!(
                f,
                "{}:{position}: no renderer for node type `{kind}` ({node})",
                from.as_deref().unwrap_or(sheen_tree::Input::ANONYMOUS)
            ),
            StringifyError::UnknownNodeType { kind, node, .. } => {
                write!(f, "no renderer for node type `{kind}` ({node})")
            }
        }
    }
}

impl std::error::Error for StringifyError {}
