//! Regenerates stylesheet text from a [`sheen_tree::Tree`].
//!
//! Output is produced as a stream of fragments pushed into a [`Builder`],
//! each tied to the node that produced it, so callers can build source
//! maps ([`MappingBuilder`]) or just concatenate ([`to_string`]).
//!
//! ```
//! use sheen_parse::{ParseOptions, parse};
//!
//! let source = "a {\n  color: red;\n}\n";
//! let tree = parse(source, &ParseOptions::new()).unwrap();
//! assert_eq!(sheen_stringify::to_string(&tree).unwrap(), source);
//! ```

mod builder;
pub use builder::{Attribution, Boundary, Builder, MappingBuilder};

mod error;
pub use error::StringifyError;

mod infer;

mod options;
pub use options::RawDefaults;

mod stringifier;
pub use stringifier::{NodeRenderer, RenderContext, Stringifier};

use sheen_tree::Tree;

/// Print `tree` into `builder` with a default [`Stringifier`].
pub fn stringify(tree: &Tree, builder: &mut dyn Builder) -> Result<(), StringifyError> {
    Stringifier::new().stringify(tree, builder)
}

/// Print `tree` to a string with a default [`Stringifier`].
pub fn to_string(tree: &Tree) -> Result<String, StringifyError> {
    Stringifier::new().to_string(tree)
}

#[cfg(test)]
mod tests;
