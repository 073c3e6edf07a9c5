//! Byte classification table driving the scan loop.
//!
//! The tokenizer never compares substrings on its hot path: every decision
//! about where a word, an at-keyword or a whitespace run ends is a lookup in
//! this table. Dialects that need different word boundaries start from
//! [`Classifier::css`] and flip bits instead of re-implementing the loop.

/// A set of byte classes, stored as bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharClass(u8);

impl CharClass {
    /// Whitespace: starts and continues a `Space` token.
    pub const SPACE: CharClass = CharClass(1 << 0);
    /// Terminates a word.
    pub const WORD_END: CharClass = CharClass(1 << 1);
    /// Terminates an at-keyword.
    pub const AT_END: CharClass = CharClass(1 << 2);
    /// Forbidden inside a single-token `(...)` group.
    pub const BAD_BRACKET: CharClass = CharClass(1 << 3);
    /// Hexadecimal digit, used by escape sequences.
    pub const HEX: CharClass = CharClass(1 << 4);

    /// Union of two class sets.
    pub const fn union(self, other: CharClass) -> CharClass {
        CharClass(self.0 | other.0)
    }

    const fn bits(self) -> u8 {
        self.0
    }
}

/// Lookup table from ASCII bytes to [`CharClass`] bits.
///
/// Bytes at or above `0x80` belong to no class, so multi-byte UTF-8
/// sequences always continue words and are never split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    table: [u8; 128],
}

const SPACES: &[u8] = b" \t\n\r\x0c";
const WORD_ENDS: &[u8] = b" \t\n\r\x0c!\"#'():;@[\\]{}";
const AT_ENDS: &[u8] = b" \t\n\r\x0c\"#'()/;[\\]{}";
const BAD_BRACKETS: &[u8] = b"\r\n\"'(/\\";
const HEX_DIGITS: &[u8] = b"0123456789abcdefABCDEF";

impl Classifier {
    /// The stock stylesheet classification.
    pub const fn css() -> Self {
        let mut table = [0u8; 128];
        mark(&mut table, SPACES, CharClass::SPACE);
        mark(&mut table, WORD_ENDS, CharClass::WORD_END);
        mark(&mut table, AT_ENDS, CharClass::AT_END);
        mark(&mut table, BAD_BRACKETS, CharClass::BAD_BRACKET);
        mark(&mut table, HEX_DIGITS, CharClass::HEX);
        Self { table }
    }

    /// Whether `byte` belongs to any class in `class`.
    #[inline(always)]
    pub fn is(&self, byte: u8, class: CharClass) -> bool {
        byte < 128 && self.table[byte as usize] & class.bits() != 0
    }

    /// Add `byte` to `class`. Non-ASCII bytes are ignored.
    pub fn insert(&mut self, byte: u8, class: CharClass) -> &mut Self {
        if byte < 128 {
            self.table[byte as usize] |= class.bits();
        }
        self
    }

    /// Remove `byte` from `class`. Non-ASCII bytes are ignored.
    pub fn remove(&mut self, byte: u8, class: CharClass) -> &mut Self {
        if byte < 128 {
            self.table[byte as usize] &= !class.bits();
        }
        self
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::css()
    }
}

const fn mark(table: &mut [u8; 128], bytes: &[u8], class: CharClass) {
    let mut i = 0;
    while i < bytes.len() {
        table[bytes[i] as usize] |= class.bits();
        i += 1;
    }
}
