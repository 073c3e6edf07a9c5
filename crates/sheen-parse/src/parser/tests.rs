use super::*;
use crate::{ParseOptions, parse};
use proptest::prelude::*;
use sheen_testhelpers::{ActualError, assert_annotated_errors, init_tracing, source_without_annotations};
use sheen_tree::Damage;

fn strict(source: &str) -> Tree {
    init_tracing();
    parse(source, &ParseOptions::new()).expect("source should parse")
}

fn tolerant(source: &str) -> Tree {
    init_tracing();
    parse(source, &ParseOptions::new().tolerant()).expect("tolerant parsing never fails")
}

/// One line per node: kind, semantic properties, then recorded raws.
fn outline(tree: &Tree) -> String {
    fn line(tree: &Tree, id: NodeId, level: usize, out: &mut String) {
        let node = &tree[id];
        out.push_str(&"  ".repeat(level));
        match node.kind() {
            NodeKind::Root => out.push_str("root"),
            NodeKind::AtRule { name, params } => out.push_str(&format!("atrule @{name} {params:?}")),
            NodeKind::Rule { selector } => out.push_str(&format!("rule {selector:?}")),
            NodeKind::Declaration {
                prop,
                value,
                important,
            } => {
                out.push_str(&format!("decl {prop} = {value:?}"));
                if *important {
                    out.push_str(" !important");
                }
            }
            NodeKind::Comment { text } => out.push_str(&format!("comment {text:?}")),
            NodeKind::Other { name, .. } => out.push_str(&format!("other {name}")),
        }
        let raws = &node.raws;
        for key in [
            "before",
            "between",
            "afterName",
            "left",
            "right",
            "important",
            "ownSemicolon",
            "after",
        ] {
            if let Some(text) = raws.get(key) {
                out.push_str(&format!(" {key}={text:?}"));
            }
        }
        if let Some(semicolon) = raws.semicolon {
            out.push_str(&format!(" semicolon={semicolon}"));
        }
        for key in ["selector.raw", "value.raw", "params.raw"] {
            if let Some(text) = raws.get(key) {
                out.push_str(&format!(" {key}={text:?}"));
            }
        }
        out.push('\n');
        for &child in tree.children(id) {
            line(tree, child, level + 1, out);
        }
    }

    let mut out = String::new();
    line(tree, tree.root(), 0, &mut out);
    out
}

fn error_kind_name(kind: &ParseErrorKind) -> &'static str {
    match kind {
        ParseErrorKind::UnclosedString => "UnclosedString",
        ParseErrorKind::UnclosedComment => "UnclosedComment",
        ParseErrorKind::UnclosedBracket => "UnclosedBracket",
        ParseErrorKind::UnclosedBlock => "UnclosedBlock",
        ParseErrorKind::UnexpectedClose => "UnexpectedClose",
        ParseErrorKind::UnknownWord(_) => "UnknownWord",
        ParseErrorKind::MissedSemicolon => "MissedSemicolon",
        ParseErrorKind::DoubleColon => "DoubleColon",
        ParseErrorKind::UnnamedAtRule => "UnnamedAtRule",
        ParseErrorKind::MissingValue => "MissingValue",
    }
}

fn assert_parse_error(annotated_source: &str) {
    init_tracing();
    let source = source_without_annotations(annotated_source);
    let err = parse(&source, &ParseOptions::new()).expect_err("source should fail to parse");
    let start = err.span.start as usize;
    assert_annotated_errors(
        annotated_source,
        vec![ActualError {
            span: start..err.span.end as usize,
            kind: error_kind_name(&err.kind).to_string(),
        }],
    );
}

#[test]
fn test_compact_rule() {
    let tree = strict(".a{color:red}");
    insta::assert_snapshot!(outline(&tree), @r#"
    root after="" semicolon=false
      rule ".a" before="" between="" after="" semicolon=false
        decl color = "red" before="" between=":"
    "#);
}

#[test]
fn test_nested_blocks_and_comments() {
    let tree = strict("@media screen {\n  a { color: red !important; }\n}\n/* c */\n");
    insta::assert_snapshot!(outline(&tree), @r#"
    root after="\n" semicolon=false
      atrule @media "screen" before="" between=" " afterName=" " after="\n" semicolon=false
        rule "a" before="\n  " between=" " after=" " semicolon=true
          decl color = "red" !important before=" " between=": "
      comment "c" before="\n" left=" " right=" "
    "#);
}

#[test]
fn test_empty_input() {
    let tree = strict("");
    assert!(tree.is_empty());
    assert_eq!(tree[tree.root()].raws.after.as_deref(), Some(""));
    assert_eq!(tree[tree.root()].raws.semicolon, None);

    let tree = strict("  \n");
    assert_eq!(tree[tree.root()].raws.after.as_deref(), Some("  \n"));
}

#[test]
fn test_bodyless_at_rules() {
    let tree = strict("@import 'a.css';\n@charset 'x' ");
    let ids = tree.children(tree.root()).to_vec();
    assert_eq!(ids.len(), 2);

    let import = &tree[ids[0]];
    assert_eq!(import.name(), Some("import"));
    assert_eq!(import.params(), Some("'a.css'"));
    assert_eq!(import.raws.after_name.as_deref(), Some(" "));
    assert_eq!(import.raws.between.as_deref(), Some(""));
    assert!(!import.has_block());

    // Trailing whitespace at end of input belongs to the root.
    let charset = &tree[ids[1]];
    assert_eq!(charset.params(), Some("'x'"));
    assert_eq!(charset.raws.between.as_deref(), Some(""));
    assert_eq!(tree[tree.root()].raws.after.as_deref(), Some(" "));
    assert_eq!(tree[tree.root()].raws.semicolon, Some(false));
}

#[test]
fn test_empty_rule() {
    let tree = strict("{}");
    let rule = tree.children(tree.root())[0];
    assert_eq!(tree[rule].selector(), Some(""));
    assert_eq!(tree[rule].raws.between.as_deref(), Some(""));
}

#[test]
fn test_comments_in_values_keep_raw() {
    let tree = strict("a { margin: 1px /* c */ 2px }");
    let decl = tree.walk_decls().next().unwrap();
    let node = &tree[decl];
    assert_eq!(node.value(), Some("1px 2px"));
    let raw = node.raws.value.as_ref().unwrap();
    assert_eq!(raw.raw, "1px /* c */ 2px");
    assert_eq!(raw.value, "1px 2px");
}

#[test]
fn test_dropped_comments_leave_one_space() {
    let source = "a { border: 1px /* a */ /* b */\n  solid/* c */ red }";
    let tree = strict(source);
    let decl = tree.walk_decls().next().unwrap();
    assert_eq!(tree[decl].value(), Some("1px solid red"));
    let raw = tree[decl].raws.value.as_ref().unwrap();
    assert_eq!(raw.raw, "1px /* a */ /* b */\n  solid/* c */ red");
    assert!(source.contains(&raw.raw));

    let tree = strict("a /* x */ b {}");
    let rule = tree.walk_rules().next().unwrap();
    assert_eq!(tree[rule].selector(), Some("a b"));
    assert_eq!(tree[rule].raws.selector.as_ref().unwrap().raw, "a /* x */ b");
}

#[test]
fn test_comment_between_words_stays_in_selector() {
    let tree = strict("a/**/b {}");
    let rule = tree.walk_rules().next().unwrap();
    assert_eq!(tree[rule].selector(), Some("a/**/b"));
    assert_eq!(tree[rule].raws.selector, None);

    let tree = strict("a /* x */ {}");
    let rule = tree.walk_rules().next().unwrap();
    assert_eq!(tree[rule].selector(), Some("a"));
    assert_eq!(tree[rule].raws.between.as_deref(), Some(" /* x */ "));
}

#[test]
fn test_own_semicolon() {
    let tree = strict("a {} ;b {}");
    let rules: Vec<_> = tree.walk_rules().collect();
    assert_eq!(tree[rules[0]].raws.own_semicolon.as_deref(), Some(" ;"));
    assert_eq!(tree[rules[1]].raws.before.as_deref(), Some(""));
}

#[test]
fn test_custom_properties() {
    let tree = strict(":root { --x: { a: b }; --empty:; }");
    let decls: Vec<_> = tree.walk_decls().collect();
    assert_eq!(tree[decls[0]].prop(), Some("--x"));
    assert_eq!(tree[decls[0]].value(), Some("{ a: b }"));
    assert_eq!(tree[decls[0]].raws.between.as_deref(), Some(": "));
    assert_eq!(tree[decls[1]].prop(), Some("--empty"));
    assert_eq!(tree[decls[1]].value(), Some(""));
}

#[test]
fn test_hacks_move_into_before() {
    let tree = strict("a { *zoom: 1; _height: 2px }");
    let decls: Vec<_> = tree.walk_decls().collect();
    assert_eq!(tree[decls[0]].prop(), Some("zoom"));
    assert_eq!(tree[decls[0]].raws.before.as_deref(), Some(" *"));
    assert_eq!(tree[decls[1]].prop(), Some("height"));
    assert_eq!(tree[decls[1]].raws.before.as_deref(), Some(" _"));
}

#[test]
fn test_important_spellings() {
    let tree = strict("a { color: red!IMPORTANT; top: 0 ! important; left: 1 !important }");
    let decls: Vec<_> = tree.walk_decls().collect();
    let raws: Vec<_> = decls
        .iter()
        .map(|&d| (tree[d].important(), tree[d].raws.important.as_deref()))
        .collect();
    assert_eq!(
        raws,
        vec![
            (true, Some("!IMPORTANT")),
            (true, Some(" ! important")),
            (true, None),
        ]
    );
    assert_eq!(tree[decls[1]].value(), Some("0"));
}

#[test]
fn test_url_and_brackets_in_values() {
    let tree = strict("a { background: url(x;y.png) no-repeat; grid: [a] 1fr }");
    let decls: Vec<_> = tree.walk_decls().collect();
    assert_eq!(tree[decls[0]].value(), Some("url(x;y.png) no-repeat"));
    assert_eq!(tree[decls[1]].value(), Some("[a] 1fr"));
}

#[test]
fn test_semicolon_flags() {
    let tree = strict("a { b: c; } d { e: f }");
    let rules: Vec<_> = tree.walk_rules().collect();
    assert_eq!(tree[rules[0]].raws.semicolon, Some(true));
    assert_eq!(tree[rules[1]].raws.semicolon, Some(false));
    // A trailing comment does not reset the flag.
    let tree = strict("a { b: c; /* x */ }");
    let rule = tree.walk_rules().next().unwrap();
    assert_eq!(tree[rule].raws.semicolon, Some(true));
}

#[test]
fn test_source_positions() {
    let tree = parse("a {\n  color: red;\n}", &ParseOptions::new().from("a.css")).unwrap();
    let rule = tree.walk_rules().next().unwrap();
    let decl = tree.walk_decls().next().unwrap();

    let source = tree[rule].source.as_ref().unwrap();
    assert_eq!(source.input.from(), Some("a.css"));
    assert_eq!((source.start.line, source.start.column, source.start.offset), (1, 1, 0));
    let end = source.end.unwrap();
    assert_eq!((end.line, end.column, end.offset), (3, 1, 19));

    let source = tree[decl].source.as_ref().unwrap();
    assert_eq!((source.start.line, source.start.column, source.start.offset), (2, 3, 6));
    let end = source.end.unwrap();
    assert_eq!((end.line, end.column, end.offset), (2, 13, 17));

    let root_end = tree[tree.root()].source.as_ref().unwrap().end.unwrap();
    assert_eq!((root_end.line, root_end.column, root_end.offset), (3, 2, 19));
}

#[test]
fn test_missing_value() {
    assert_parse_error(
        r#"
.a { color: }
            ^ MissingValue
"#,
    );
    let err = parse(".a { color: }", &ParseOptions::new()).unwrap_err();
    assert_eq!(err.offset(), 12);
}

#[test]
fn test_missing_value_before_semicolon() {
    assert_parse_error(
        r#"
a { color: ; top: 0 }
           ^ MissingValue
"#,
    );
}

#[test]
fn test_unknown_word() {
    assert_parse_error(
        r#"
a { b c: d }
      ^ UnknownWord
"#,
    );
    assert_parse_error(
        r#"
foo;
^^^ UnknownWord
"#,
    );
}

#[test]
fn test_unexpected_close() {
    assert_parse_error(
        r#"
a {}
}
^ UnexpectedClose
"#,
    );
}

#[test]
fn test_unclosed_block() {
    assert_parse_error(
        r#"
a { color: red
^ UnclosedBlock
"#,
    );
}

#[test]
fn test_missed_semicolon() {
    assert_parse_error(
        r#"
a { color: red
              ^ MissedSemicolon
  margin: 0 }
"#,
    );
}

#[test]
fn test_double_colon() {
    assert_parse_error(
        r#"
a { color: :red }
           ^ DoubleColon
"#,
    );
}

#[test]
fn test_unnamed_at_rule() {
    assert_parse_error(
        r#"
@ a;
^ UnnamedAtRule
"#,
    );
}

#[test]
fn test_unclosed_tokens() {
    assert_parse_error(
        r#"
a { b: (c }
       ^ UnclosedBracket
"#,
    );
    assert_parse_error(
        r#"
a { content: "x }
             ^ UnclosedString
"#,
    );
    assert_parse_error(
        r#"
/* x
^^ UnclosedComment
"#,
    );
}

#[test]
fn test_tolerant_closes_blocks() {
    let tree = tolerant("a { b { color: red");
    assert_eq!(tree.mode(), Mode::Tolerant);
    assert!(tree.is_recovered());
    let rules: Vec<_> = tree.walk_rules().collect();
    assert_eq!(rules.len(), 2);
    let damage: Vec<_> = tree.recoveries().iter().map(|r| (r.damage, r.node)).collect();
    assert_eq!(
        damage,
        vec![
            (Damage::UnclosedBlock, Some(rules[1])),
            (Damage::UnclosedBlock, Some(rules[0])),
        ]
    );
    assert!(tree[rules[0]].raws.is_damaged());
    assert_eq!(tree[rules[1]].raws.after.as_deref(), Some(""));
    assert_eq!(end_offset(&tree, rules[0]), Some(18));
    assert_eq!(end_offset(&tree, rules[1]), Some(18));
    let decl = tree.walk_decls().next().unwrap();
    assert_eq!(tree[decl].value(), Some("red"));
}

#[test]
fn test_tolerant_keeps_stray_text() {
    let tree = tolerant("a { color: red } }");
    let root = &tree[tree.root()];
    assert_eq!(root.raws.after.as_deref(), Some(" }"));
    assert_eq!(tree.recoveries()[0].damage, Damage::UnexpectedClose);
    assert_eq!(tree.recoveries()[0].message, "unexpected `}`");

    let tree = tolerant("foo; a {}");
    let rule = tree.walk_rules().next().unwrap();
    assert_eq!(tree[rule].raws.before.as_deref(), Some("foo; "));
    assert_eq!(tree.recoveries()[0].damage, Damage::UnknownWord);
}

#[test]
fn test_tolerant_unknown_word_in_between() {
    let tree = tolerant("a { b c: d }");
    let decl = tree.walk_decls().next().unwrap();
    assert_eq!(tree[decl].prop(), Some("b"));
    assert_eq!(tree[decl].raws.between.as_deref(), Some(" c: "));
    assert_eq!(tree[decl].value(), Some("d"));
    assert_eq!(tree[decl].raws.damage, vec![Damage::UnknownWord]);
}

fn end_offset(tree: &Tree, id: NodeId) -> Option<u32> {
    tree[id].source.as_ref()?.end.map(|end| end.offset)
}

#[test]
fn test_bodyless_at_rule_at_end_of_input() {
    for (source, end) in [("@foo", 4), ("@foo ", 4), ("a{} @bar", 8), ("@import x", 9), ("a{@foo}", 6)] {
        let tree = strict(source);
        let at_rule = tree.walk_at_rules().next().unwrap();
        assert_eq!(end_offset(&tree, at_rule), Some(end), "{source:?}");
        check_spans(&tree, tree.root()).unwrap();
    }
}

#[test]
fn test_tolerant_splits_missed_semicolon() {
    let tree = tolerant("a { color: red margin: 0 }");
    let decls: Vec<_> = tree.walk_decls().collect();
    assert_eq!(decls.len(), 2);
    assert_eq!(tree[decls[0]].prop(), Some("color"));
    assert_eq!(tree[decls[0]].value(), Some("red"));
    assert_eq!(tree[decls[1]].prop(), Some("margin"));
    assert_eq!(tree[decls[1]].value(), Some("0"));
    assert_eq!(tree[decls[1]].raws.before.as_deref(), Some(" "));
    assert_eq!(tree[decls[0]].raws.damage, vec![Damage::MissedSemicolon]);
    assert_eq!(end_offset(&tree, decls[0]), Some(14));
    assert_eq!(tree[decls[1]].source.as_ref().unwrap().start.offset, 15);
    assert_eq!(end_offset(&tree, decls[1]), Some(24));
}

#[test]
fn test_tolerant_missing_value() {
    let tree = tolerant(".a{color:}");
    let decl = tree.walk_decls().next().unwrap();
    assert_eq!(tree[decl].value(), Some(""));
    assert_eq!(tree[decl].raws.damage, vec![Damage::MissingValue]);
    let recovery = &tree.recoveries()[0];
    assert_eq!(recovery.position.offset, 9);
}

#[test]
fn test_tolerant_heals_unclosed_string() {
    let tree = tolerant("a { content: \"x");
    let decl = tree.walk_decls().next().unwrap();
    assert_eq!(tree[decl].value(), Some("\"x"));
    let damage: Vec<_> = tree.recoveries().iter().map(|r| r.damage).collect();
    assert_eq!(damage, vec![Damage::UnclosedBlock, Damage::UnclosedString]);
    assert_eq!(tree[decl].raws.damage, vec![Damage::UnclosedString]);
}

#[test]
fn test_tolerant_accepts_valid_input_unchanged() {
    let source = "a { color: red; }\n@media print { b { top: 0 } }\n";
    let tree = tolerant(source);
    assert!(!tree.is_recovered());
    assert_eq!(
        tree.to_semantic_json(tree.root()),
        strict(source).to_semantic_json(tree.root())
    );
}

fn stylesheet() -> impl Strategy<Value = String> {
    let decl = ("[a-z]{1,6}", "[a-z0-9#]{1,6}", "[ ]{0,2}")
        .prop_map(|(prop, value, ws)| format!("{prop}:{ws}{value};"));
    let rule = (
        "[a-z.#]{1,6}",
        prop::collection::vec(decl, 0..4),
        "[ \n]{0,3}",
    )
        .prop_map(|(selector, decls, ws)| format!("{selector}{ws}{{{ws}{}{ws}}}", decls.join(ws.as_str())));
    let comment = "[a-z ]{0,5}".prop_map(|text| format!("/*{text}*/"));
    let item = prop_oneof![rule.clone(), comment];
    let media = prop::collection::vec(rule, 0..3)
        .prop_map(|rules| format!("@media print {{\n{}\n}}", rules.join("\n")));
    let tail = prop::option::of(("[a-z]{1,4}", "[ ]{0,2}", "[a-z]{0,4}", "[ \n]{0,2}"))
        .prop_map(|tail| {
            tail.map_or_else(String::new, |(name, gap, params, ws)| {
                format!("\n@{name}{gap}{params}{ws}")
            })
        });
    (prop::collection::vec(prop_oneof![item, media], 0..5), tail)
        .prop_map(|(items, tail)| items.join("\n") + &tail)
}

fn check_spans(tree: &Tree, id: NodeId) -> Result<(), TestCaseError> {
    let source = tree[id].source.as_ref().unwrap();
    let end = source.end.unwrap();
    prop_assert!(end.offset >= source.start.offset);

    let mut previous_end = source.start.offset;
    for &child in tree.children(id) {
        let child_source = tree[child].source.as_ref().unwrap();
        let child_end = child_source.end.unwrap();
        prop_assert!(child_source.start.offset >= previous_end);
        prop_assert!(child_end.offset <= end.offset);
        previous_end = child_end.offset;
        check_spans(tree, child)?;
    }
    Ok(())
}

proptest! {
    #[test]
    fn spans_nest(source in stylesheet()) {
        let tree = parse(&source, &ParseOptions::new()).unwrap();
        check_spans(&tree, tree.root())?;
    }

    #[test]
    fn tolerant_never_fails(source in "[a-z{}:;@/*\"() \n!-]{0,48}") {
        let tree = parse(&source, &ParseOptions::new().tolerant());
        prop_assert!(tree.is_ok());
    }
}
