//! Parser for stylesheet sources.
//!
//! [`parse`] turns source text into a [`Tree`] that remembers every byte of
//! formatting, so printing the untouched tree gives back the input exactly.
//!
//! ```
//! use sheen_parse::{ParseOptions, parse};
//!
//! let tree = parse("a { color: red }", &ParseOptions::new()).unwrap();
//! let decl = tree.walk_decls().next().unwrap();
//! assert_eq!(tree[decl].value(), Some("red"));
//! ```

use std::sync::Arc;

pub use sheen_tokenizer::Span;
use sheen_tree::{Input, Mode, Tree};

mod diagnostic;
pub use diagnostic::{ParseError, ParseErrorKind};

mod parser;
pub use parser::Parser;

/// Options for [`parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// File name recorded in node sources and error messages.
    pub from: Option<String>,
    pub mode: Mode,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file name of the input.
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Repair malformed input instead of failing.
    pub fn tolerant(self) -> Self {
        self.mode(Mode::Tolerant)
    }
}

/// Parse `source` into a tree.
pub fn parse(source: &str, options: &ParseOptions) -> Result<Tree, ParseError> {
    let mut input = Input::new(source);
    if let Some(from) = &options.from {
        input = input.with_from(from.clone());
    }
    let input = Arc::new(input);
    Parser::new(&input, options.mode).parse()
}
