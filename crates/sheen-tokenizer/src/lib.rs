//! A lossless tokenizer for stylesheet-like sources.
//!
//! Every byte of the input ends up in exactly one token, whitespace and
//! comments included, so concatenating token texts gives back the source.

mod classify;
pub use classify::{CharClass, Classifier};

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind};

mod tokenizer;
pub use tokenizer::{TokenizeError, TokenizeErrorKind, Tokenizer, Unclosed, tokenize};
