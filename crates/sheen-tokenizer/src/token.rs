//! Token types produced by the tokenizer.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Run of whitespace: spaces, tabs, newlines, form feeds.
    Space,
    /// Anything that is not punctuation, whitespace, a string or a comment:
    /// `color`, `.a`, `#fff`, `10px`, `!important`, `\2014`
    Word,
    /// Quoted string including its quotes: `"a"`, `'b'`
    String,
    /// At-keyword including the `@`: `@media`
    AtWord,
    /// Comment including delimiters: `/* ... */`
    Comment,
    /// Simple parenthesized group kept as one token: `(min-width: 10px)`,
    /// or the body of an unquoted `url(...)`.
    Brackets,

    // Punctuation
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
}

impl TokenKind {
    /// Whitespace or comment.
    #[inline]
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Space | TokenKind::Comment)
    }

    /// Single-character structural punctuation.
    pub fn is_punctuation(&self) -> bool {
        matches!(
            self,
            TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Colon
                | TokenKind::Semicolon
        )
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The source text of this token.
    pub text: &'src str,
    /// Set when the tokenizer ran out of input inside this construct and,
    /// being tolerant, closed it at the end of the input.
    pub healed: bool,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self {
            kind,
            span,
            text,
            healed: false,
        }
    }
}
