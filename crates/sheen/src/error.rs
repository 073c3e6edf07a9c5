use std::fmt;

use sheen_parse::ParseError;
use sheen_stringify::StringifyError;
use sheen_tree::TreeError;

/// Any error the engine reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Parse(ParseError),
    Stringify(StringifyError),
    Tree(TreeError),
    /// No syntax is registered under this name.
    UnknownSyntax(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => e.fmt(f),
            Error::Stringify(e) => e.fmt(f),
            Error::Tree(e) => e.fmt(f),
            Error::UnknownSyntax(name) => write!(f, "unknown syntax `{name}`"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Stringify(e) => Some(e),
            Error::Tree(e) => Some(e),
            Error::UnknownSyntax(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<StringifyError> for Error {
    fn from(e: StringifyError) -> Self {
        Error::Stringify(e)
    }
}

impl From<TreeError> for Error {
    fn from(e: TreeError) -> Self {
        Error::Tree(e)
    }
}
