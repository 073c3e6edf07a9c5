//! The scan loop.

use crate::classify::{CharClass, Classifier};
use crate::{Span, Token, TokenKind};
use tracing::trace;

/// What to do when the input ends inside a string, comment or bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unclosed {
    /// Fail with a [`TokenizeError`] pointing at the opening delimiter.
    #[default]
    Fail,
    /// Close the construct at the end of the input and flag the token as
    /// [`healed`](Token::healed).
    Heal,
}

/// Kind of tokenizer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizeErrorKind {
    /// `"` or `'` without a matching closing quote.
    UnclosedString,
    /// `/*` without `*/`.
    UnclosedComment,
    /// `url(` without a matching `)`.
    UnclosedBracket,
}

/// The input ended inside a construct that needs a terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizeError {
    pub kind: TokenizeErrorKind,
    /// Byte offset of the opening delimiter.
    pub offset: u32,
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenizeErrorKind::UnclosedString => write!(f, "unclosed string"),
            TokenizeErrorKind::UnclosedComment => write!(f, "unclosed comment"),
            TokenizeErrorKind::UnclosedBracket => write!(f, "unclosed bracket"),
        }?;
        write!(f, " at offset {}", self.offset)
    }
}

impl std::error::Error for TokenizeError {}

/// A tokenizer that produces lossless tokens from stylesheet source text.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// `source` as bytes; all scanning happens here.
    bytes: &'src [u8],
    /// Current byte position in `source`.
    pos: usize,
    classifier: Classifier,
    unclosed: Unclosed,
    /// Tokens handed back by the consumer, most recent last.
    returned: Vec<Token<'src>>,
    /// The most recent word since the last `(`, for `url(` detection.
    last_word: Option<&'src str>,
    /// Set by the scanners when the current token ran into end of input.
    healed: bool,
    failed: bool,
}

impl<'src> Tokenizer<'src> {
    /// Create a strict tokenizer with the stock classification.
    pub fn new(source: &'src str) -> Self {
        Self::with_classifier(source, Classifier::css())
    }

    /// Create a tokenizer that heals unclosed constructs instead of failing.
    pub fn tolerant(source: &'src str) -> Self {
        Self::new(source).unclosed(Unclosed::Heal)
    }

    /// Create a tokenizer over a custom classification table.
    pub fn with_classifier(source: &'src str, classifier: Classifier) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            classifier,
            unclosed: Unclosed::Fail,
            returned: Vec::new(),
            last_word: None,
            healed: false,
            failed: false,
        }
    }

    /// Set the policy for constructs left open at end of input.
    pub fn unclosed(mut self, unclosed: Unclosed) -> Self {
        self.unclosed = unclosed;
        self
    }

    /// The source text being tokenized.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Byte position of the scan head. Tokens handed back with
    /// [`back`](Self::back) are not accounted for.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos as u32
    }

    /// True once the input is exhausted and no token has been handed back.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.returned.is_empty() && self.pos >= self.bytes.len()
    }

    /// Hand a token back; it is returned by the next call to
    /// [`next_token`](Self::next_token).
    pub fn back(&mut self, token: Token<'src>) {
        self.returned.push(token);
    }

    #[inline(always)]
    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    #[inline(always)]
    fn is(&self, pos: usize, class: CharClass) -> bool {
        match self.byte_at(pos) {
            Some(b) => self.classifier.is(b, class),
            None => false,
        }
    }

    /// Get the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token<'src>>, TokenizeError> {
        if let Some(token) = self.returned.pop() {
            return Ok(Some(token));
        }
        if self.pos >= self.bytes.len() {
            return Ok(None);
        }

        let start = self.pos;
        let byte = self.bytes[start];
        self.healed = false;

        let kind = if self.classifier.is(byte, CharClass::SPACE) {
            let mut end = start + 1;
            while self.is(end, CharClass::SPACE) {
                end += 1;
            }
            self.pos = end;
            TokenKind::Space
        } else {
            match byte {
                b'[' => self.single(TokenKind::LBracket),
                b']' => self.single(TokenKind::RBracket),
                b'{' => self.single(TokenKind::LBrace),
                b'}' => self.single(TokenKind::RBrace),
                b':' => self.single(TokenKind::Colon),
                b';' => self.single(TokenKind::Semicolon),
                b')' => self.single(TokenKind::RParen),
                b'(' => self.open_paren(start)?,
                b'"' | b'\'' => self.string(start, byte)?,
                b'@' => self.at_word(start),
                b'\\' => self.escape(start),
                b'/' if self.byte_at(start + 1) == Some(b'*') => self.comment(start)?,
                _ => self.word(start),
            }
        };

        Ok(Some(self.token(kind, start)))
    }

    /// Create a token from `start` to the current position.
    fn token(&self, kind: TokenKind, start: usize) -> Token<'src> {
        let span = Span::new(start as u32, self.pos as u32);
        let text = &self.source[start..self.pos];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token {
            kind,
            span,
            text,
            healed: self.healed,
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    /// Handle an unterminated construct that opened at `start`.
    fn unclosed_at(&mut self, kind: TokenizeErrorKind, start: usize) -> Result<(), TokenizeError> {
        match self.unclosed {
            Unclosed::Fail => Err(TokenizeError {
                kind,
                offset: start as u32,
            }),
            Unclosed::Heal => {
                self.pos = self.bytes.len();
                self.healed = true;
                Ok(())
            }
        }
    }

    /// Index of the next `terminator` at or after `from` that is not
    /// escaped by an odd run of backslashes.
    fn find_unescaped(&self, terminator: u8, from: usize) -> Option<usize> {
        let mut search = from;
        loop {
            let found = search + self.source[search..].find(terminator as char)?;
            let mut backslashes = 0;
            while found - backslashes > from && self.bytes[found - backslashes - 1] == b'\\' {
                backslashes += 1;
            }
            if backslashes % 2 == 0 {
                return Some(found);
            }
            search = found + 1;
        }
    }

    /// `(`: an unquoted `url(` body, a simple group, or a lone paren.
    fn open_paren(&mut self, start: usize) -> Result<TokenKind, TokenizeError> {
        let previous = self.last_word.take();
        let url_body = previous == Some("url")
            && !matches!(
                self.byte_at(start + 1),
                Some(b'"' | b'\'' | b' ' | b'\n' | b'\t' | b'\r' | b'\x0c')
            );

        if url_body {
            match self.find_unescaped(b')', start + 1) {
                Some(close) => self.pos = close + 1,
                None => self.unclosed_at(TokenizeErrorKind::UnclosedBracket, start)?,
            }
            return Ok(TokenKind::Brackets);
        }

        let Some(rel) = self.source[start + 1..].find(')') else {
            self.pos = start + 1;
            return Ok(TokenKind::LParen);
        };
        let close = start + 1 + rel;
        let bad = (start + 1..close).any(|i| self.classifier.is(self.bytes[i], CharClass::BAD_BRACKET));
        if bad {
            self.pos = start + 1;
            Ok(TokenKind::LParen)
        } else {
            self.pos = close + 1;
            Ok(TokenKind::Brackets)
        }
    }

    /// Quoted string; jumps from quote to quote.
    fn string(&mut self, start: usize, quote: u8) -> Result<TokenKind, TokenizeError> {
        match self.find_unescaped(quote, start + 1) {
            Some(close) => self.pos = close + 1,
            None => self.unclosed_at(TokenizeErrorKind::UnclosedString, start)?,
        }
        Ok(TokenKind::String)
    }

    fn comment(&mut self, start: usize) -> Result<TokenKind, TokenizeError> {
        match self.source[start + 2..].find("*/") {
            Some(rel) => self.pos = start + 2 + rel + 2,
            None => self.unclosed_at(TokenizeErrorKind::UnclosedComment, start)?,
        }
        Ok(TokenKind::Comment)
    }

    fn at_word(&mut self, start: usize) -> TokenKind {
        let mut end = start + 1;
        while end < self.bytes.len() && !self.is(end, CharClass::AT_END) {
            end += 1;
        }
        self.pos = end;
        TokenKind::AtWord
    }

    /// Backslash escape: a run of backslashes, then the escaped character,
    /// then (for hex escapes) the remaining hex digits and one space.
    fn escape(&mut self, start: usize) -> TokenKind {
        let mut next = start;
        let mut escaping = true;
        while self.byte_at(next + 1) == Some(b'\\') {
            next += 1;
            escaping = !escaping;
        }

        if escaping
            && let Some(escaped) = self.byte_at(next + 1)
            && !matches!(escaped, b'/' | b' ' | b'\n' | b'\t' | b'\r' | b'\x0c')
        {
            next += self.source[next + 1..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            if self.is(next, CharClass::HEX) {
                while self.is(next + 1, CharClass::HEX) {
                    next += 1;
                }
                if self.byte_at(next + 1) == Some(b' ') {
                    next += 1;
                }
            }
        }

        self.pos = next + 1;
        TokenKind::Word
    }

    /// Plain word: runs to the next word-end byte or the start of a comment.
    fn word(&mut self, start: usize) -> TokenKind {
        let mut end = start + 1;
        while end < self.bytes.len() {
            let b = self.bytes[end];
            if self.classifier.is(b, CharClass::WORD_END)
                || (b == b'/' && self.byte_at(end + 1) == Some(b'*'))
            {
                break;
            }
            end += 1;
        }
        // The first byte may open a multi-byte character.
        while !self.source.is_char_boundary(end) {
            end += 1;
        }
        self.pos = end;
        self.last_word = Some(&self.source[start..end]);
        TokenKind::Word
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Result<Token<'src>, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Tokenize a whole source eagerly with the strict policy.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, TokenizeError> {
    Tokenizer::new(source).collect()
}
