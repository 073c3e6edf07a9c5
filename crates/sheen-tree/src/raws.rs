//! Preserved formatting for exact regeneration.

use std::collections::BTreeMap;

/// A cached source form of a semantic property.
///
/// `value` is what the property was normalized to when `raw` was recorded.
/// The raw form is only valid while the property still equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    pub value: String,
    pub raw: String,
}

/// What the tolerant parser had to repair on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Damage {
    /// The block was still open at end of input and was closed there.
    UnclosedBlock,
    /// A string ran to the end of the input.
    UnclosedString,
    /// A comment ran to the end of the input.
    UnclosedComment,
    /// A bracket group ran to the end of the input.
    UnclosedBracket,
    /// A declaration had no value.
    MissingValue,
    /// A `}` appeared with no open block.
    UnexpectedClose,
    /// Two declarations ran together without a `;`.
    MissedSemicolon,
    /// A declaration started with `:`.
    DoubleColon,
    /// `@` without a name.
    UnnamedAtRule,
    /// Text that fits no construct was folded into whitespace.
    UnknownWord,
}

impl Damage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Damage::UnclosedBlock => "unclosed-block",
            Damage::UnclosedString => "unclosed-string",
            Damage::UnclosedComment => "unclosed-comment",
            Damage::UnclosedBracket => "unclosed-bracket",
            Damage::MissingValue => "missing-value",
            Damage::UnexpectedClose => "unexpected-close",
            Damage::MissedSemicolon => "missed-semicolon",
            Damage::DoubleColon => "double-colon",
            Damage::UnnamedAtRule => "unnamed-at-rule",
            Damage::UnknownWord => "unknown-word",
        }
    }
}

/// Formatting preserved for a node.
///
/// A `None` field has not been recorded and is inferred by the stringifier
/// from the surrounding document. Keys that dialects need beyond the core
/// set live in `extra`; the core stringifier never renders them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Raws {
    /// Whitespace and stray text before the node.
    pub before: Option<String>,
    /// Whitespace after the last child, before the closing `}`.
    pub after: Option<String>,
    /// Declarations: text between prop and value, colon included.
    /// Rules and at-rules: whitespace before `{` (or before `;`).
    pub between: Option<String>,
    /// Whether the last declaration of a container ends with `;`.
    pub semicolon: Option<bool>,
    /// At-rules: whitespace between the name and the params.
    pub after_name: Option<String>,
    /// Comments: whitespace after `/*`.
    pub left: Option<String>,
    /// Comments: whitespace before `*/`.
    pub right: Option<String>,
    /// Declarations: the `!important` text when not spelled ` !important`.
    pub important: Option<String>,
    /// Rules: a `;` (and the whitespace before it) following the `}`.
    pub own_semicolon: Option<String>,
    pub selector: Option<RawValue>,
    pub value: Option<RawValue>,
    pub params: Option<RawValue>,
    /// Repairs made by the tolerant parser.
    pub damage: Vec<Damage>,
    pub extra: BTreeMap<String, String>,
}

impl Raws {
    /// Look up a textual raw by its key.
    ///
    /// Core keys use their camel-case names (`before`, `afterName`,
    /// `ownSemicolon`, `value.raw`, ...). Anything else is read from
    /// [`extra`](Self::extra).
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "before" => self.before.as_deref(),
            "after" => self.after.as_deref(),
            "between" => self.between.as_deref(),
            "afterName" => self.after_name.as_deref(),
            "left" => self.left.as_deref(),
            "right" => self.right.as_deref(),
            "important" => self.important.as_deref(),
            "ownSemicolon" => self.own_semicolon.as_deref(),
            "selector.raw" => self.selector.as_ref().map(|r| r.raw.as_str()),
            "value.raw" => self.value.as_ref().map(|r| r.raw.as_str()),
            "params.raw" => self.params.as_ref().map(|r| r.raw.as_str()),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Set a textual raw by its key. See [`get`](Self::get) for key names.
    ///
    /// Setting `value.raw` (or the selector/params equivalents) directly is
    /// not supported because the cached value would be unknown; those keys
    /// land in `extra` like any other unknown key.
    pub fn set(&mut self, key: &str, text: impl Into<String>) {
        let text = Some(text.into());
        match key {
            "before" => self.before = text,
            "after" => self.after = text,
            "between" => self.between = text,
            "afterName" => self.after_name = text,
            "left" => self.left = text,
            "right" => self.right = text,
            "important" => self.important = text,
            "ownSemicolon" => self.own_semicolon = text,
            _ => {
                self.extra.insert(key.to_string(), text.unwrap_or_default());
            }
        }
    }

    /// Forget a raw by its key.
    pub fn remove(&mut self, key: &str) {
        match key {
            "before" => self.before = None,
            "after" => self.after = None,
            "between" => self.between = None,
            "semicolon" => self.semicolon = None,
            "afterName" => self.after_name = None,
            "left" => self.left = None,
            "right" => self.right = None,
            "important" => self.important = None,
            "ownSemicolon" => self.own_semicolon = None,
            "selector.raw" | "selector" => self.selector = None,
            "value.raw" | "value" => self.value = None,
            "params.raw" | "params" => self.params = None,
            _ => {
                self.extra.remove(key);
            }
        }
    }

    /// Whether the tolerant parser repaired anything on this node.
    pub fn is_damaged(&self) -> bool {
        !self.damage.is_empty()
    }
}
