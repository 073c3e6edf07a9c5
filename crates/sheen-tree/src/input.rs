//! Source text and line/column lookup.

/// A location in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, counted in characters.
    pub column: u32,
    /// 0-based byte offset.
    pub offset: u32,
}

impl Position {
    /// Position of the first character of a document.
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The text a tree was parsed from.
///
/// An `Input` is immutable once created. Trees and node sources share it
/// through an `Arc`, so it lives as long as any node that points into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    css: String,
    from: Option<String>,
    /// Byte offset of the first character of every line.
    line_starts: Vec<u32>,
}

impl Input {
    /// Name used in messages when the input has no file name.
    pub const ANONYMOUS: &'static str = "<css input>";

    pub fn new(css: impl Into<String>) -> Self {
        let css = css.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            css.bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i as u32 + 1),
        );
        Self {
            css,
            from: None,
            line_starts,
        }
    }

    /// Attach the file name the text was read from.
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// The full source text.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// The file name, if one was given.
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// The file name, or [`Input::ANONYMOUS`].
    pub fn display_name(&self) -> &str {
        self.from.as_deref().unwrap_or(Self::ANONYMOUS)
    }

    /// Length of the source in bytes.
    pub fn len(&self) -> u32 {
        self.css.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.css.is_empty()
    }

    /// Line and column of the character at `offset`.
    ///
    /// Offsets past the end clamp to the end of input; offsets inside a
    /// multi-byte character snap back to its first byte.
    pub fn position(&self, offset: u32) -> Position {
        let mut offset = (offset as usize).min(self.css.len());
        while !self.css.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self
            .line_starts
            .partition_point(|&start| start as usize <= offset);
        let line_start = self.line_starts[line - 1] as usize;
        let column = self.css[line_start..offset].chars().count() + 1;
        Position {
            line: line as u32,
            column: column as u32,
            offset: offset as u32,
        }
    }

    /// End position of a construct spanning up to `end` (exclusive).
    ///
    /// Line and column name the last character of the construct; the offset
    /// stays exclusive so that `end.offset - start.offset` is the byte length.
    pub fn end_position(&self, end: u32) -> Position {
        Position {
            offset: end,
            ..self.position(end.saturating_sub(1))
        }
    }
}
