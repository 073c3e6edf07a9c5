//! Fallback formatting used when a raw can be neither read nor inferred.

/// Formatting used for raws that nothing in the document demonstrates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefaults {
    /// One level of indentation (default: two spaces).
    ///
    /// Used only when the document has no indented node to learn from.
    pub indent: String,

    /// Declaration text between prop and value (default: `": "`).
    pub colon: String,

    /// Whitespace before a block's `{` (default: `" "`).
    pub before_open: String,

    /// Content of a block with no children (default: empty, giving `{}`).
    pub empty_body: String,

    /// Whitespace after `/*` (default: `" "`).
    pub comment_left: String,

    /// Whitespace before `*/` (default: `" "`).
    pub comment_right: String,

    /// Whether the last declaration of a block gets a `;` (default: false).
    pub semicolon: bool,
}

impl Default for RawDefaults {
    fn default() -> Self {
        Self {
            indent: "  ".into(),
            colon: ": ".into(),
            before_open: " ".into(),
            empty_body: String::new(),
            comment_left: " ".into(),
            comment_right: " ".into(),
            semicolon: false,
        }
    }
}

impl RawDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the indentation unit.
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Set the text between a declaration's prop and value.
    pub fn colon(mut self, colon: impl Into<String>) -> Self {
        self.colon = colon.into();
        self
    }

    /// End the last declaration of every block with `;`.
    pub fn semicolon(mut self, semicolon: bool) -> Self {
        self.semicolon = semicolon;
        self
    }
}
