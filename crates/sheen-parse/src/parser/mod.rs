//! Token stream to node tree.

use std::sync::Arc;

use sheen_tokenizer::{Span, Token, TokenKind, Tokenizer};
use sheen_tree::{Input, Mode, NodeId, NodeKind, NodeType, RawValue, Recovery, Source, Tree};
use tracing::{debug, trace};

use crate::{ParseError, ParseErrorKind};

/// Builds a [`Tree`] from one [`Input`].
///
/// The parser keeps the container it is currently filling, the whitespace
/// seen since the last node (which becomes the next node's `before` or the
/// container's `after`), and whether the last declaration ended with `;`.
pub struct Parser<'src> {
    input: &'src Arc<Input>,
    tokenizer: Tokenizer<'src>,
    tree: Tree,
    mode: Mode,
    current: NodeId,
    spaces: String,
    semicolon: bool,
    /// Most recently created node, which owns a healed final token.
    last_node: Option<NodeId>,
    /// Tokens the tokenizer closed at end of input, by start offset.
    healed: Vec<(ParseErrorKind, Span)>,
}

impl<'src> Parser<'src> {
    pub fn new(input: &'src Arc<Input>, mode: Mode) -> Self {
        let tokenizer = match mode {
            Mode::Strict => Tokenizer::new(input.css()),
            Mode::Tolerant => Tokenizer::tolerant(input.css()),
        };
        let mut tree = Tree::new(Arc::clone(input));
        tree.set_mode(mode);
        let current = tree.root();
        Self {
            input,
            tokenizer,
            tree,
            mode,
            current,
            spaces: String::new(),
            semicolon: false,
            last_node: None,
            healed: Vec::new(),
        }
    }

    /// Parse the whole input.
    pub fn parse(mut self) -> Result<Tree, ParseError> {
        debug!(from = self.input.display_name(), mode = ?self.mode, "parse");
        while let Some(token) = self.next()? {
            match token.kind {
                TokenKind::Space => self.spaces.push_str(token.text),
                TokenKind::Semicolon => self.free_semicolon(token),
                TokenKind::RBrace => self.end(token)?,
                TokenKind::Comment => self.comment(token),
                TokenKind::AtWord => self.at_rule(token)?,
                TokenKind::LBrace => self.empty_rule(token),
                _ => self.other(token)?,
            }
        }
        self.end_file()?;
        Ok(self.tree)
    }

    fn next(&mut self) -> Result<Option<Token<'src>>, ParseError> {
        let token = match self.tokenizer.next_token() {
            Ok(token) => token,
            Err(err) => return Err(ParseError::from_tokenize(err, self.input)),
        };
        if let Some(token) = token
            && token.healed
            && !self.healed.iter().any(|(_, span)| span.start == token.span.start)
        {
            let kind = match token.kind {
                TokenKind::String => ParseErrorKind::UnclosedString,
                TokenKind::Comment => ParseErrorKind::UnclosedComment,
                _ => ParseErrorKind::UnclosedBracket,
            };
            self.healed.push((kind, token.span));
        }
        Ok(token)
    }

    /// Report a malformed construct. Strict mode fails; tolerant mode
    /// records the repair and lets the caller carry on.
    fn problem(
        &mut self,
        kind: ParseErrorKind,
        span: Span,
        node: Option<NodeId>,
    ) -> Result<(), ParseError> {
        let error = ParseError::new(kind, span, self.input);
        match self.mode {
            Mode::Strict => Err(error),
            Mode::Tolerant => {
                debug!(%error, ?node, "recovered");
                self.tree.record_recovery(Recovery {
                    damage: error.kind.damage(),
                    message: error.kind.to_string(),
                    position: error.position,
                    node,
                });
                Ok(())
            }
        }
    }

    /// Create a node in the current container, starting at `offset`.
    fn init(&mut self, kind: NodeKind, offset: u32) -> NodeId {
        let is_comment = matches!(kind, NodeKind::Comment { .. });
        let id = self.tree.create(kind);
        let appended = self.tree.append(self.current, id);
        debug_assert!(appended.is_ok());

        let node = &mut self.tree[id];
        node.source = Some(Source {
            input: Arc::clone(self.input),
            start: self.input.position(offset),
            end: None,
        });
        node.raws.before = Some(std::mem::take(&mut self.spaces));
        if !is_comment {
            self.semicolon = false;
        }
        trace!(?id, parent = ?self.current, offset, "init node");
        self.last_node = Some(id);
        id
    }

    /// Set the end of `id` to the character before `end`.
    fn finish(&mut self, id: NodeId, end: u32) {
        let position = self.input.end_position(end);
        if let Some(source) = &mut self.tree[id].source {
            source.end = Some(position);
        }
    }

    fn comment(&mut self, token: Token<'src>) {
        let id = self.init(NodeKind::comment(""), token.span.start);
        self.finish(id, token.span.end);

        let inner = token.text.strip_prefix("/*").unwrap_or(token.text);
        let inner = if token.healed {
            inner
        } else {
            inner.strip_suffix("*/").unwrap_or(inner)
        };

        let node = &mut self.tree[id];
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            node.raws.left = Some(inner.to_string());
            node.raws.right = Some(String::new());
        } else {
            let left = inner.len() - inner.trim_start().len();
            let right = inner.trim_end().len();
            node.raws.left = Some(inner[..left].to_string());
            node.raws.right = Some(inner[right..].to_string());
            *node.kind_mut() = NodeKind::comment(trimmed);
        }
    }

    /// A `{` with nothing before it opens a rule with an empty selector.
    fn empty_rule(&mut self, token: Token<'src>) {
        let id = self.init(NodeKind::rule(""), token.span.start);
        self.tree[id].raws.between = Some(String::new());
        trace!(?id, "open block");
        self.current = id;
    }

    /// Collect tokens until it is clear whether they form a rule or a
    /// declaration.
    fn other(&mut self, start: Token<'src>) -> Result<(), ParseError> {
        let custom_property = start.text.starts_with("--");
        let mut end = false;
        let mut colon = false;
        let mut bracket: Option<Span> = None;
        let mut brackets: Vec<TokenKind> = Vec::new();
        let mut terminator = self.input.len();
        let mut tokens = Vec::new();

        let mut next = Some(start);
        while let Some(token) = next {
            tokens.push(token);
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket => {
                    bracket.get_or_insert(token.span);
                    brackets.push(if token.kind == TokenKind::LParen {
                        TokenKind::RParen
                    } else {
                        TokenKind::RBracket
                    });
                }
                TokenKind::LBrace if custom_property && colon => {
                    bracket.get_or_insert(token.span);
                    brackets.push(TokenKind::RBrace);
                }
                kind if brackets.is_empty() => match kind {
                    TokenKind::Semicolon if colon => {
                        return self.decl(tokens, custom_property, token.span.start);
                    }
                    TokenKind::Semicolon => break,
                    TokenKind::LBrace => return self.rule(tokens),
                    TokenKind::RBrace => {
                        tokens.pop();
                        self.tokenizer.back(token);
                        terminator = token.span.start;
                        end = true;
                        break;
                    }
                    TokenKind::Colon => colon = true,
                    _ => {}
                },
                kind if brackets.last() == Some(&kind) => {
                    brackets.pop();
                    if brackets.is_empty() {
                        bracket = None;
                    }
                }
                _ => {}
            }
            next = self.next()?;
        }

        if self.tokenizer.is_eof() {
            end = true;
        }
        if let Some(open) = bracket {
            self.problem(ParseErrorKind::UnclosedBracket, open, None)?;
        }

        if end && colon {
            if !custom_property {
                while tokens.last().is_some_and(|t| t.kind.is_trivia()) {
                    if let Some(last) = tokens.pop() {
                        self.tokenizer.back(last);
                    }
                }
            }
            self.decl(tokens, custom_property, terminator)
        } else {
            self.unknown_word(tokens)
        }
    }

    fn rule(&mut self, mut tokens: Vec<Token<'src>>) -> Result<(), ParseError> {
        let Some(open) = tokens.pop() else {
            return Ok(());
        };
        let start = tokens.first().map_or(open.span.start, |t| t.span.start);
        let between = spaces_and_comments_from_end(&mut tokens);
        let (selector, raw) = raw_value(&tokens, false);

        let id = self.init(NodeKind::rule(selector), start);
        let raws = &mut self.tree[id].raws;
        raws.between = Some(between);
        raws.selector = raw;
        trace!(?id, "open block");
        self.current = id;
        Ok(())
    }

    fn decl(
        &mut self,
        mut tokens: Vec<Token<'src>>,
        custom_property: bool,
        terminator: u32,
    ) -> Result<(), ParseError> {
        if self.mode == Mode::Tolerant
            && !(tokens.len() > 1 && tokens.iter().any(|t| t.kind == TokenKind::Word))
        {
            return self.unknown_word(tokens);
        }
        let Some(&last) = tokens.last() else {
            return Ok(());
        };

        let id = self.init(NodeKind::decl("", ""), tokens[0].span.start);
        if last.kind == TokenKind::Semicolon {
            self.semicolon = true;
            tokens.pop();
        }
        self.finish(id, last.span.end);

        let Some(lead) = tokens.iter().position(|t| t.kind == TokenKind::Word) else {
            let stray = tokens.split_off(tokens.len().saturating_sub(1));
            return self.unknown_word(stray);
        };
        let mut before = self.tree[id].raws.before.take().unwrap_or_default();
        for token in tokens.drain(..lead) {
            before.push_str(token.text);
        }
        let start = self.input.position(tokens[0].span.start);
        if let Some(source) = &mut self.tree[id].source {
            source.start = start;
        }

        let prop_len = tokens
            .iter()
            .position(|t| matches!(t.kind, TokenKind::Colon) || t.kind.is_trivia())
            .unwrap_or(tokens.len());
        let mut prop: String = tokens.drain(..prop_len).map(|t| t.text).collect();

        let mut between = String::new();
        let mut taken = 0;
        for token in &tokens {
            taken += 1;
            between.push_str(token.text);
            if token.kind == TokenKind::Colon {
                break;
            }
            if token.kind == TokenKind::Word
                && token.text.chars().any(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                self.problem(
                    ParseErrorKind::UnknownWord(token.text.to_string()),
                    token.span,
                    Some(id),
                )?;
            }
        }
        tokens.drain(..taken);

        if prop.starts_with(['_', '*']) {
            before.push(prop.remove(0));
        }

        let leading = tokens.iter().take_while(|t| t.kind.is_trivia()).count();
        let mut first_spaces: Vec<Token<'src>> = tokens.drain(..leading).collect();

        if self.mode == Mode::Tolerant {
            self.split_missed_semicolon(&mut tokens, id, terminator)?;
        }

        let (important, important_raw) = take_important(&mut tokens);

        if tokens.iter().any(|t| !t.kind.is_trivia()) {
            for token in first_spaces.drain(..) {
                between.push_str(token.text);
            }
        }
        first_spaces.extend_from_slice(&tokens);
        let (value, raw) = raw_value(&first_spaces, custom_property);

        let node = &mut self.tree[id];
        *node.kind_mut() = NodeKind::Declaration {
            prop,
            value: value.clone(),
            important,
        };
        node.raws.before = Some(before);
        node.raws.between = Some(between);
        node.raws.important = important_raw;
        node.raws.value = raw;
        trace!(?id, "decl");

        if self.mode == Mode::Strict && !custom_property && value.contains(':') {
            self.check_missed_semicolon(&tokens, id)?;
        }
        if !custom_property && value.is_empty() {
            self.problem(ParseErrorKind::MissingValue, Span::empty(terminator), Some(id))?;
        }
        Ok(())
    }

    /// Index of the first top-level `:` in a value, skipping `progid:`.
    fn colon(&mut self, tokens: &[Token<'src>], node: NodeId) -> Result<Option<usize>, ParseError> {
        let mut depth = 0i32;
        let mut prev: Option<&Token<'src>> = None;
        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                TokenKind::Colon if depth == 0 => match prev {
                    None => self.problem(ParseErrorKind::DoubleColon, token.span, Some(node))?,
                    Some(p) if p.kind == TokenKind::Word && p.text == "progid" => continue,
                    Some(_) => return Ok(Some(i)),
                },
                _ => {}
            }
            prev = Some(token);
        }
        Ok(None)
    }

    fn check_missed_semicolon(&mut self, tokens: &[Token<'src>], node: NodeId) -> Result<(), ParseError> {
        let Some(colon) = self.colon(tokens, node)? else {
            return Ok(());
        };
        let mut found = 0;
        let mut culprit = tokens[colon];
        for token in tokens[..colon].iter().rev() {
            culprit = *token;
            if token.kind != TokenKind::Space {
                found += 1;
                if found == 2 {
                    break;
                }
            }
        }
        let offset = if culprit.kind == TokenKind::Word {
            culprit.span.end
        } else {
            culprit.span.start
        };
        self.problem(ParseErrorKind::MissedSemicolon, Span::empty(offset), Some(node))
    }

    /// Tolerant mode: split `a: b c: d` into two declarations at the word
    /// before the second colon.
    fn split_missed_semicolon(
        &mut self,
        tokens: &mut Vec<Token<'src>>,
        node: NodeId,
        terminator: u32,
    ) -> Result<(), ParseError> {
        let Some(colon) = self.colon(tokens, node)? else {
            return Ok(());
        };
        let Some(next_start) = tokens[..colon].iter().rposition(|t| t.kind == TokenKind::Word)
        else {
            return Ok(());
        };
        if next_start == 0 {
            return Ok(());
        }
        let prev_end = tokens[..next_start]
            .iter()
            .rposition(|t| t.kind != TokenKind::Space)
            .map_or(0, |i| i + 1);

        let culprit = tokens[next_start].span;
        self.problem(ParseErrorKind::MissedSemicolon, Span::empty(culprit.start), Some(node))?;
        if let Some(first_end) = prev_end.checked_sub(1).map(|i| tokens[i].span.end) {
            self.finish(node, first_end);
        }

        let other = tokens.split_off(next_start);
        self.spaces = tokens.drain(prev_end..).map(|t| t.text).collect();
        let semicolon = self.semicolon;
        self.decl(other, false, terminator)?;
        self.semicolon = semicolon;
        Ok(())
    }

    fn at_rule(&mut self, token: Token<'src>) -> Result<(), ParseError> {
        let name = &token.text[1..];
        let name_end = token.span.end;
        let id = self.init(NodeKind::at_rule(name, ""), token.span.start);
        if name.is_empty() {
            self.problem(ParseErrorKind::UnnamedAtRule, token.span, Some(id))?;
        }

        let mut params: Vec<Token<'src>> = Vec::new();
        let mut brackets: Vec<TokenKind> = Vec::new();
        let mut open = false;
        let mut last = false;

        while let Some(token) = self.next()? {
            match token.kind {
                TokenKind::LParen => brackets.push(TokenKind::RParen),
                TokenKind::LBracket => brackets.push(TokenKind::RBracket),
                TokenKind::LBrace if !brackets.is_empty() => brackets.push(TokenKind::RBrace),
                kind if brackets.last() == Some(&kind) => {
                    brackets.pop();
                }
                _ => {}
            }

            if brackets.is_empty() {
                match token.kind {
                    TokenKind::Semicolon => {
                        self.finish(id, token.span.end);
                        self.semicolon = true;
                        break;
                    }
                    TokenKind::LBrace => {
                        open = true;
                        break;
                    }
                    TokenKind::RBrace => {
                        let end = last_non_space(&params).map_or(name_end, |t| t.span.end);
                        self.finish(id, end);
                        self.end(token)?;
                        break;
                    }
                    _ => params.push(token),
                }
            } else {
                params.push(token);
            }

            if self.tokenizer.is_eof() {
                last = true;
                break;
            }
        }

        let mut between = spaces_and_comments_from_end(&mut params);
        let after_name = spaces_and_comments_from_start(&mut params);
        let (value, raw) = raw_value(&params, false);
        if last && let Some(final_token) = params.last() {
            self.finish(id, final_token.span.end);
            self.spaces = std::mem::take(&mut between);
        }
        // Bodyless and cut off by the end of input.
        if !open && self.tree[id].source.as_ref().is_some_and(|s| s.end.is_none()) {
            let end = last_non_space(&params).map_or(name_end, |t| t.span.end);
            self.finish(id, end);
        }

        let node = &mut self.tree[id];
        *node.kind_mut() = NodeKind::at_rule(name, value);
        node.raws.between = Some(between);
        node.raws.after_name = Some(after_name);
        node.raws.params = raw;

        if open {
            let opened = self.tree.open_block(id);
            debug_assert!(opened.is_ok());
            trace!(?id, "open block");
            self.current = id;
        }
        Ok(())
    }

    /// `}`: close the current block.
    fn end(&mut self, token: Token<'src>) -> Result<(), ParseError> {
        let current = self.current;
        let has_children = !self.tree.children(current).is_empty();
        let node = &mut self.tree[current];
        if has_children {
            node.raws.semicolon = Some(self.semicolon);
        }
        self.semicolon = false;
        node.raws
            .after
            .get_or_insert_with(String::new)
            .push_str(&self.spaces);
        self.spaces.clear();

        match self.tree.parent(current) {
            Some(parent) => {
                self.finish(current, token.span.end);
                trace!(id = ?current, "close block");
                self.current = parent;
            }
            None => {
                self.problem(ParseErrorKind::UnexpectedClose, token.span, Some(current))?;
                if let Some(after) = &mut self.tree[current].raws.after {
                    after.push_str(token.text);
                }
            }
        }
        Ok(())
    }

    fn end_file(&mut self) -> Result<(), ParseError> {
        let root = self.tree.root();
        if self.current != root {
            let span = self.start_span(self.current);
            self.problem(ParseErrorKind::UnclosedBlock, span, Some(self.current))?;
        }

        let current = self.current;
        if !self.tree.children(current).is_empty() {
            self.tree[current].raws.semicolon = Some(self.semicolon);
        }
        let spaces = std::mem::take(&mut self.spaces);
        self.tree[current]
            .raws
            .after
            .get_or_insert_with(String::new)
            .push_str(&spaces);

        // Tolerant mode closes every block still open.
        while let Some(parent) = self.tree.parent(self.current) {
            self.finish(self.current, self.input.len());
            self.current = parent;
            if parent != root {
                let span = self.start_span(parent);
                self.problem(ParseErrorKind::UnclosedBlock, span, Some(parent))?;
            }
            self.tree[parent].raws.after.get_or_insert_with(String::new);
        }

        let end = self.input.position(self.input.len());
        if let Some(source) = &mut self.tree[root].source {
            source.end = Some(end);
        }

        for (kind, span) in std::mem::take(&mut self.healed) {
            self.problem(kind, span, self.last_node)?;
        }
        debug!(nodes = self.tree.len(), recovered = self.tree.is_recovered(), "parsed");
        Ok(())
    }

    fn start_span(&self, id: NodeId) -> Span {
        let start = self.tree[id].source.as_ref().map_or(0, |s| s.start.offset);
        Span::new(start, (start + 1).min(self.input.len()).max(start))
    }

    /// A `;` between nodes. Right after a rule it is kept as that rule's
    /// `ownSemicolon`; anywhere else it is whitespace.
    fn free_semicolon(&mut self, token: Token<'src>) {
        self.spaces.push_str(token.text);
        if let Some(&prev) = self.tree.children(self.current).last()
            && self.tree[prev].node_type() == NodeType::Rule
            && self.tree[prev].raws.own_semicolon.is_none()
        {
            self.tree[prev].raws.own_semicolon = Some(std::mem::take(&mut self.spaces));
        }
    }

    fn unknown_word(&mut self, tokens: Vec<Token<'src>>) -> Result<(), ParseError> {
        let Some(first) = tokens.first() else {
            return Ok(());
        };
        let kind = ParseErrorKind::UnknownWord(first.text.to_string());
        self.problem(kind, first.span, None)?;
        for token in &tokens {
            self.spaces.push_str(token.text);
        }
        Ok(())
    }
}

fn last_non_space<'t, 'src>(tokens: &'t [Token<'src>]) -> Option<&'t Token<'src>> {
    tokens.iter().rev().find(|t| t.kind != TokenKind::Space)
}

/// Remove trailing whitespace and comment tokens, returning their text.
fn spaces_and_comments_from_end(tokens: &mut Vec<Token<'_>>) -> String {
    let keep = tokens
        .iter()
        .rposition(|t| !t.kind.is_trivia())
        .map_or(0, |i| i + 1);
    tokens.drain(keep..).map(|t| t.text).collect()
}

/// Remove leading whitespace and comment tokens, returning their text.
fn spaces_and_comments_from_start(tokens: &mut Vec<Token<'_>>) -> String {
    let skip = tokens.iter().take_while(|t| t.kind.is_trivia()).count();
    tokens.drain(..skip).map(|t| t.text).collect()
}

/// Find `!important` at the end of a value and remove it.
///
/// Returns whether it was found, and its spelling when that is not exactly
/// ` !important`.
fn take_important(tokens: &mut Vec<Token<'_>>) -> (bool, Option<String>) {
    for i in (0..tokens.len()).rev() {
        let token = tokens[i];
        if token.text.eq_ignore_ascii_case("!important") {
            let tail: String = tokens.drain(i..).map(|t| t.text).collect();
            let spaces_from = tokens
                .iter()
                .rposition(|t| t.kind != TokenKind::Space)
                .map_or(0, |j| j + 1);
            let spaces: String = tokens.drain(spaces_from..).map(|t| t.text).collect();
            let spelled = spaces + &tail;
            let raw = (spelled != " !important").then_some(spelled);
            return (true, raw);
        }
        if token.text.eq_ignore_ascii_case("important") {
            // `! important`, possibly with comments in between.
            let mut cut = tokens.len();
            let mut spelled = String::new();
            for j in (1..=i).rev() {
                if spelled.trim_start().starts_with('!') && tokens[j].kind != TokenKind::Space {
                    break;
                }
                cut -= 1;
                spelled.insert_str(0, tokens[cut].text);
            }
            if spelled.trim().starts_with('!') {
                tokens.truncate(cut);
                return (true, Some(spelled));
            }
        }
        if !token.kind.is_trivia() {
            break;
        }
    }
    (false, None)
}

/// Normalize a selector, value or params token run.
///
/// Comments next to whitespace or at either edge are dropped, as is one
/// trailing whitespace token. A dropped comment leaves at most one run of
/// whitespace behind. When that changes anything the source text is
/// returned as the raw form.
fn raw_value(tokens: &[Token<'_>], custom_property: bool) -> (String, Option<RawValue>) {
    let mut value = String::new();
    let mut clean = true;
    let mut dropped = false;
    let loose = |kind: Option<TokenKind>| matches!(kind, None | Some(TokenKind::Space));

    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Space if i + 1 == tokens.len() && !custom_property => clean = false,
            TokenKind::Space if dropped && value.ends_with(char::is_whitespace) => clean = false,
            TokenKind::Comment => {
                let prev = i.checked_sub(1).map(|p| tokens[p].kind);
                let next = tokens.get(i + 1).map(|t| t.kind);
                if !loose(prev) && !loose(next) && !value.ends_with(',') {
                    value.push_str(token.text);
                } else {
                    clean = false;
                    dropped = true;
                    continue;
                }
            }
            _ => value.push_str(token.text),
        }
        dropped = false;
    }

    let raw = (!clean).then(|| RawValue {
        value: value.clone(),
        raw: tokens.iter().map(|t| t.text).collect(),
    });
    (value, raw)
}

#[cfg(test)]
mod tests;
