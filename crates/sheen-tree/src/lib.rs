//! Editable node tree for stylesheet sources.
//!
//! A [`Tree`] is an arena of [`Node`]s addressed by [`NodeId`]. Every node
//! carries its semantic properties (selector, prop, value, ...) in its
//! [`NodeKind`] and the exact formatting it was parsed with in its [`Raws`].
//! The stringifier uses those raws to reproduce the source byte for byte,
//! and infers them from the rest of the document when they are missing.
//!
//! Setters such as [`Node::set_value`] drop the cached raw form of the
//! property they change, so an edited value is never printed with its old
//! spelling.

mod input;
pub use input::{Input, Position};

mod json;

mod node;
pub use node::{Node, NodeKind, NodeType, Source};

mod raws;
pub use raws::{Damage, RawValue, Raws};

mod tree;
pub use tree::{Mode, NodeId, RawInconsistencyError, Recovery, Tree, TreeError};

mod walk;
pub use walk::Walk;
