//! Parse errors and their rendering.

use ariadne::{Color, Label, Report, ReportKind, Source};
use sheen_tokenizer::{Span, TokenizeError, TokenizeErrorKind};
use sheen_tree::{Damage, Input, Position};

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnclosedString,
    UnclosedComment,
    UnclosedBracket,
    /// A block was still open at end of input.
    UnclosedBlock,
    /// `}` with no open block.
    UnexpectedClose,
    /// Text that fits no construct.
    UnknownWord(String),
    /// Two declarations run together: `color: red margin: 0`.
    MissedSemicolon,
    /// A value starting with another `:`.
    DoubleColon,
    /// `@` with no name.
    UnnamedAtRule,
    /// A declaration with nothing after the colon.
    MissingValue,
}

impl ParseErrorKind {
    /// The damage the tolerant parser records for this problem.
    pub fn damage(&self) -> Damage {
        match self {
            ParseErrorKind::UnclosedString => Damage::UnclosedString,
            ParseErrorKind::UnclosedComment => Damage::UnclosedComment,
            ParseErrorKind::UnclosedBracket => Damage::UnclosedBracket,
            ParseErrorKind::UnclosedBlock => Damage::UnclosedBlock,
            ParseErrorKind::UnexpectedClose => Damage::UnexpectedClose,
            ParseErrorKind::UnknownWord(_) => Damage::UnknownWord,
            ParseErrorKind::MissedSemicolon => Damage::MissedSemicolon,
            ParseErrorKind::DoubleColon => Damage::DoubleColon,
            ParseErrorKind::UnnamedAtRule => Damage::UnnamedAtRule,
            ParseErrorKind::MissingValue => Damage::MissingValue,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ParseErrorKind::UnclosedString => "string opened here",
            ParseErrorKind::UnclosedComment => "comment opened here",
            ParseErrorKind::UnclosedBracket => "bracket opened here",
            ParseErrorKind::UnclosedBlock => "block opened here",
            ParseErrorKind::UnexpectedClose => "nothing to close",
            ParseErrorKind::UnknownWord(_) => "not a rule, declaration or at-rule",
            ParseErrorKind::MissedSemicolon => "previous declaration ends here",
            ParseErrorKind::DoubleColon => "second colon",
            ParseErrorKind::UnnamedAtRule => "expected a name after `@`",
            ParseErrorKind::MissingValue => "value expected before this",
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            ParseErrorKind::UnclosedString => Some("add the matching closing quote"),
            ParseErrorKind::UnclosedComment => Some("add a closing `*/`"),
            ParseErrorKind::UnclosedBracket => Some("add a closing `)`"),
            ParseErrorKind::UnclosedBlock => Some("add a closing `}`"),
            ParseErrorKind::MissedSemicolon => Some("separate declarations with `;`"),
            ParseErrorKind::UnknownWord(_) => {
                Some("declarations need a `:` and rules need a `{`")
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::UnclosedString => write!(f, "unclosed string"),
            ParseErrorKind::UnclosedComment => write!(f, "unclosed comment"),
            ParseErrorKind::UnclosedBracket => write!(f, "unclosed bracket"),
            ParseErrorKind::UnclosedBlock => write!(f, "unclosed block"),
            ParseErrorKind::UnexpectedClose => write!(f, "unexpected `}}`"),
            ParseErrorKind::UnknownWord(word) => write!(f, "unknown word `{word}`"),
            ParseErrorKind::MissedSemicolon => write!(f, "missed semicolon"),
            ParseErrorKind::DoubleColon => write!(f, "double colon"),
            ParseErrorKind::UnnamedAtRule => write!(f, "at-rule without name"),
            ParseErrorKind::MissingValue => write!(f, "missing value"),
        }
    }
}

impl From<TokenizeErrorKind> for ParseErrorKind {
    fn from(kind: TokenizeErrorKind) -> Self {
        match kind {
            TokenizeErrorKind::UnclosedString => ParseErrorKind::UnclosedString,
            TokenizeErrorKind::UnclosedComment => ParseErrorKind::UnclosedComment,
            TokenizeErrorKind::UnclosedBracket => ParseErrorKind::UnclosedBracket,
        }
    }
}

/// A parser error with source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// The offending text; empty when the problem is a missing piece.
    pub span: Span,
    /// Line and column of `span.start`.
    pub position: Position,
    /// File name of the input, if it had one.
    pub from: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, input: &Input) -> Self {
        Self {
            kind,
            span,
            position: input.position(span.start),
            from: input.from().map(str::to_owned),
        }
    }

    pub(crate) fn from_tokenize(err: TokenizeError, input: &Input) -> Self {
        Self::new(err.kind.into(), Span::new(err.offset, err.offset + 1), input)
    }

    /// Byte offset the error points at.
    pub fn offset(&self) -> u32 {
        self.span.start
    }

    fn filename(&self) -> &str {
        self.from.as_deref().unwrap_or(Input::ANONYMOUS)
    }

    /// Render this error with ariadne.
    ///
    /// `source` must be the text that was parsed.
    pub fn render(&self, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| self.to_string())
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, source: &str, writer: W) {
        let filename = self.filename();
        let report = self.build_report(filename, source.len());
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
        len: usize,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let start = (self.span.start as usize).min(len);
        let end = (self.span.end as usize).clamp(start, len);
        let range = start..end;

        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(self.kind.to_string())
            .with_label(
                Label::new((filename, range))
                    .with_message(self.kind.label())
                    .with_color(Color::Red),
            );
        if let Some(help) = self.kind.help() {
            report = report.with_help(help);
        }
        report
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.filename(), self.position, self.kind)
    }
}

impl std::error::Error for ParseError {}
