//! Round-tripping stylesheet engine.
//!
//! Parse a stylesheet into an editable [`Tree`], change it, and print it
//! back. Everything the tree does not know to have changed prints exactly
//! as it was written, down to whitespace and comments.
//!
//! ```
//! use sheen::{ParseOptions, parse, to_string};
//!
//! let mut tree = parse("a {\n  color: red;\n}\n", &ParseOptions::new()).unwrap();
//! let decl = tree.walk_decls().next().unwrap();
//! tree[decl].set_value("blue").unwrap();
//! assert_eq!(to_string(&tree).unwrap(), "a {\n  color: blue;\n}\n");
//! ```
//!
//! Syntaxes pair a parser with a stringifier and can be looked up by name:
//!
//! ```
//! use sheen::{ParseOptions, SyntaxRegistry};
//!
//! let registry = SyntaxRegistry::with_builtins();
//! let processed = registry
//!     .process("safe-css", "a { color: red", &ParseOptions::new())
//!     .unwrap();
//! assert_eq!(processed.css, "a { color: red}");
//! assert!(processed.tree.is_recovered());
//! ```

mod error;
pub use error::Error;

mod syntax;
pub use syntax::{Css, SafeCss, Syntax, SyntaxRegistry};

pub use sheen_parse::{ParseError, ParseErrorKind, ParseOptions, parse};
pub use sheen_stringify::{
    Attribution, Boundary, Builder, MappingBuilder, NodeRenderer, RawDefaults, RenderContext,
    Stringifier, StringifyError, stringify, to_string,
};
pub use sheen_tokenizer::{Span, Token, TokenKind, TokenizeError, Tokenizer, tokenize};
pub use sheen_tree::{
    Damage, Input, Mode, Node, NodeId, NodeKind, NodeType, Position, RawInconsistencyError,
    RawValue, Raws, Recovery, Source, Tree, TreeError, Walk,
};

/// Result of [`process`].
#[derive(Debug, Clone)]
pub struct Processed {
    /// The parsed tree; `mappings` refer to its nodes.
    pub tree: Tree,
    pub css: String,
    pub mappings: Vec<Attribution>,
}

/// Parse `source` with `syntax` and print the tree back with it, recording
/// where every node landed in the output.
pub fn process(source: &str, syntax: &dyn Syntax, options: &ParseOptions) -> Result<Processed, Error> {
    let tree = syntax.parse(source, options)?;
    let mut builder = MappingBuilder::new(&tree);
    syntax.stringify(&tree, &mut builder)?;
    let (css, mappings) = builder.finish();
    tracing::debug!(
        syntax = syntax.name(),
        bytes = css.len(),
        mappings = mappings.len(),
        "processed"
    );
    Ok(Processed {
        tree,
        css,
        mappings,
    })
}
