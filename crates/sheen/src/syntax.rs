//! Named parser and stringifier pairs.

use std::collections::BTreeMap;
use std::sync::Arc;

use sheen_parse::{ParseError, ParseOptions};
use sheen_stringify::{Builder, Stringifier, StringifyError};
use sheen_tree::{Mode, Tree};
use tracing::debug;

use crate::{Error, Processed, process};

/// A parser and a stringifier that understand the same syntax.
///
/// Only a tree parsed by a syntax and printed by that same syntax is
/// guaranteed to round-trip.
pub trait Syntax: Send + Sync {
    fn name(&self) -> &str;

    fn parse(&self, source: &str, options: &ParseOptions) -> Result<Tree, ParseError>;

    fn stringify(&self, tree: &Tree, builder: &mut dyn Builder) -> Result<(), StringifyError>;
}

/// Plain stylesheets. Malformed input is an error.
#[derive(Debug, Clone, Default)]
pub struct Css {
    stringifier: Stringifier,
}

impl Css {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print with a customized stringifier, for example one with dialect
    /// renderers registered.
    pub fn with_stringifier(stringifier: Stringifier) -> Self {
        Self { stringifier }
    }
}

impl Syntax for Css {
    fn name(&self) -> &str {
        "css"
    }

    fn parse(&self, source: &str, options: &ParseOptions) -> Result<Tree, ParseError> {
        sheen_parse::parse(source, &options.clone().mode(Mode::Strict))
    }

    fn stringify(&self, tree: &Tree, builder: &mut dyn Builder) -> Result<(), StringifyError> {
        self.stringifier.stringify(tree, builder)
    }
}

/// Plain stylesheets, repairing malformed input instead of failing.
///
/// Trees parsed from malformed input print whatever survived the repair;
/// they do not reproduce the input.
#[derive(Debug, Clone, Default)]
pub struct SafeCss {
    stringifier: Stringifier,
}

impl SafeCss {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Syntax for SafeCss {
    fn name(&self) -> &str {
        "safe-css"
    }

    fn parse(&self, source: &str, options: &ParseOptions) -> Result<Tree, ParseError> {
        sheen_parse::parse(source, &options.clone().tolerant())
    }

    fn stringify(&self, tree: &Tree, builder: &mut dyn Builder) -> Result<(), StringifyError> {
        self.stringifier.stringify(tree, builder)
    }
}

/// Syntaxes by name.
#[derive(Clone, Default)]
pub struct SyntaxRegistry {
    syntaxes: BTreeMap<String, Arc<dyn Syntax>>,
}

impl std::fmt::Debug for SyntaxRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.syntaxes.keys()).finish()
    }
}

impl SyntaxRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`Css`] and [`SafeCss`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Css::new());
        registry.register(SafeCss::new());
        registry
    }

    /// Add `syntax` under its own name, replacing any syntax of that name.
    pub fn register(&mut self, syntax: impl Syntax + 'static) {
        let name = syntax.name().to_string();
        debug!(%name, "registering syntax");
        self.syntaxes.insert(name, Arc::new(syntax));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Syntax, Error> {
        self.syntaxes
            .get(name)
            .map(|syntax| syntax.as_ref())
            .ok_or_else(|| Error::UnknownSyntax(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.syntaxes.keys().map(String::as_str)
    }

    /// [`process`] with the syntax registered as `name`.
    pub fn process(
        &self,
        name: &str,
        source: &str,
        options: &ParseOptions,
    ) -> Result<Processed, Error> {
        process(source, self.get(name)?, options)
    }
}
