use sheen_parse::{ParseOptions, parse};
use sheen_testhelpers::{assert_round_trip, init_tracing};
use sheen_tree::{NodeId, NodeKind, Position, RawValue, Tree};

use super::*;

fn strict(source: &str) -> Tree {
    init_tracing();
    parse(source, &ParseOptions::new()).expect("source should parse")
}

fn print(tree: &Tree) -> String {
    to_string(tree).expect("core node kinds always print")
}

/// Every builder call, one per line: text, node, boundary.
fn calls(tree: &Tree) -> String {
    let mut out = String::new();
    stringify(
        tree,
        &mut |text: &str, node: Option<NodeId>, boundary: Option<Boundary>| {
            let node = node.map_or("-".to_string(), |n| n.to_string());
            let boundary = boundary.map_or(String::new(), |b| format!(" {b}"));
            out.push_str(&format!("{text:?} {node}{boundary}\n"));
        },
    )
    .unwrap();
    out
}

#[test]
fn test_round_trip_corpus() {
    let corpus = [
        "",
        "  \n",
        ".a{color:red}",
        "a { color: red; }\n",
        "@media screen and (min-width: 100px) {\n  .a, .b > c { margin: 0 auto !important ; }\n}\n",
        "@import url(foo.css) screen;\n@charset \"utf-8\";",
        "/* lead */\na{b:c!IMPORTANT;*zoom:1;_h:2px}\n/**/",
        "a {} ;b { }\n",
        ":root { --x: { a: b }; --y:  1px ; }",
        "a{margin:1px /* c */ 2px;}",
        "@font-face{font-family:x}@page :first{}",
        "a /* x */ { b /* y */ : c }",
        "\r\n a {\r\n\tb: c;\r\n}\r\n",
        "@media print { @page { margin: 1cm } }",
        "a { content: \"str;}\" }",
        "a::before { content: '}' ; top : 0 ! important }",
        "a { background: url( x.png ) no-repeat, url(\"y.png\") }",
        "@supports (display: grid) and (not (display: inline-grid)) {\n  a { grid: [a] 1fr / auto }\n}\n",
        "a{}\n\n\n/* trailing */   ",
    ];
    for source in corpus {
        assert_round_trip(source, &print(&strict(source)));
    }
}

#[test]
fn test_compact_rule_builder_calls() {
    let tree = strict(".a{color:red}");
    insta::assert_snapshot!(calls(&tree), @r#"
    "" #0 start
    ".a{" #1 start
    "color:red" #2
    "}" #1 end
    "" #0 end
    "#);
}

#[test]
fn test_whitespace_is_unattributed() {
    let tree = strict("a {\n  b: c;\n} ;\n/* x */\n");
    insta::assert_snapshot!(calls(&tree), @r#"
    "" #0 start
    "a {" #1 start
    "\n  " -
    "b: c;" #2
    "\n" -
    "}" #1 end
    " ;" -
    "\n" -
    "/* x */" #3
    "\n" -
    "" #0 end
    "#);
}

#[test]
fn test_changed_value_drops_raw() {
    let mut tree = strict("a { margin: 1px }");
    let decl = tree.walk_decls().next().unwrap();
    tree[decl].raws.value = Some(RawValue {
        value: "1px".into(),
        raw: "1px /* c */".into(),
    });
    assert_eq!(print(&tree), "a { margin: 1px /* c */ }");

    tree[decl].set_value("2px").unwrap();
    assert_eq!(print(&tree), "a { margin: 2px }");
}

#[test]
fn test_stale_raw_is_ignored() {
    let mut tree = strict("a { margin: 1px /* c */ 2px }");
    let decl = tree.walk_decls().next().unwrap();
    if let NodeKind::Declaration { value, .. } = tree[decl].kind_mut() {
        *value = "3px".into();
    }
    assert!(tree.check_raws().is_err());
    assert_eq!(print(&tree), "a { margin: 3px }");
}

#[test]
fn test_edited_properties() {
    let mut tree = strict("@media  screen {a{color:red!important}}");
    let at_rule = tree.walk_at_rules().next().unwrap();
    let rule = tree.walk_rules().next().unwrap();
    let decl = tree.walk_decls().next().unwrap();
    tree[at_rule].set_params("print").unwrap();
    tree[rule].set_selector("b, c").unwrap();
    tree[decl].set_prop("background").unwrap();
    tree[decl].set_important(false).unwrap();
    assert_eq!(print(&tree), "@media  print {b, c{background:red}}");

    tree[decl].set_important(true).unwrap();
    assert_eq!(print(&tree), "@media  print {b, c{background:red !important}}");
}

#[test]
fn test_synthesized_document_uses_defaults() {
    let mut tree = Tree::empty();
    let root = tree.root();
    let rule = tree.create(NodeKind::rule("a"));
    let color = tree.create(NodeKind::decl("color", "red"));
    let margin = tree.create(NodeKind::decl("margin", "0"));
    tree.append(root, rule).unwrap();
    tree.append(rule, color).unwrap();
    tree.append(rule, margin).unwrap();
    assert_eq!(print(&tree), "a {\n  color: red;\n  margin: 0\n}");

    let indented = Stringifier::new().indent("\t").to_string(&tree).unwrap();
    assert_eq!(indented, "a {\n\tcolor: red;\n\tmargin: 0\n}");
}

#[test]
fn test_synthesized_at_rules_and_comments() {
    let mut tree = Tree::empty();
    let root = tree.root();
    let comment = tree.create(NodeKind::comment("note"));
    let import = tree.create(NodeKind::at_rule("import", "'x.css'"));
    let font_face = tree.create(NodeKind::at_rule("font-face", ""));
    tree.open_block(font_face).unwrap();
    let decl = tree.create(NodeKind::decl("font-family", "x"));
    for id in [comment, import, font_face] {
        tree.append(root, id).unwrap();
    }
    tree.append(font_face, decl).unwrap();
    assert_eq!(
        print(&tree),
        "/* note */\n@import 'x.css';\n@font-face {\n  font-family: x\n}"
    );
}

#[test]
fn test_appended_decl_copies_sibling() {
    let mut tree = strict("a {\n    color: red;\n}");
    let rule = tree.walk_rules().next().unwrap();
    let decl = tree.create(NodeKind::decl("margin", "0"));
    tree.append(rule, decl).unwrap();
    assert_eq!(print(&tree), "a {\n    color: red;\n    margin: 0;\n}");
}

#[test]
fn test_appended_rule_learns_from_document() {
    let mut tree = strict("a {\n\tcolor: red;\n}\n");
    let root = tree.root();
    let rule = tree.create(NodeKind::rule("b"));
    let decl = tree.create(NodeKind::decl("margin", "0"));
    tree.append(root, rule).unwrap();
    tree.append(rule, decl).unwrap();
    assert_eq!(
        print(&tree),
        "a {\n\tcolor: red;\n}\nb {\n\tmargin: 0;\n}\n"
    );
}

#[test]
fn test_empty_body_follows_document() {
    let mut tree = strict("a {}\n");
    let root = tree.root();
    let rule = tree.create(NodeKind::rule("b"));
    tree.append(root, rule).unwrap();
    assert_eq!(print(&tree), "a {}\nb {}\n");
}

#[test]
fn test_moved_decl_reindents() {
    let source = "a {\n  color: red;\n}\n@media print {\n  b {\n    margin: 0;\n  }\n}\n";
    let mut tree = strict(source);
    let color = tree.walk_decls().next().unwrap();
    let b = tree.walk_rules().nth(1).unwrap();
    tree.move_to(color, b, 0).unwrap();
    assert_eq!(
        print(&tree),
        "a {\n}\n@media print {\n  b {\n    color: red;\n    margin: 0;\n  }\n}\n"
    );
}

#[test]
fn test_hack_is_not_copied() {
    let mut tree = strict("a {\n  *zoom: 1;\n}");
    let rule = tree.walk_rules().next().unwrap();
    let decl = tree.create(NodeKind::decl("top", "0"));
    tree.append(rule, decl).unwrap();
    assert_eq!(print(&tree), "a {\n  *zoom: 1;\n  top: 0;\n}");
}

#[test]
fn test_clean_raws_reformats() {
    let mut tree = strict("a{color:red;margin:0}");
    let root = tree.root();
    tree.clean_raws(root, false);
    assert_eq!(print(&tree), "a {\n  color: red;\n  margin: 0\n}");
}

#[test]
fn test_stringify_detached_node() {
    let mut tree = strict("a {\n  color: red;\n}\n");
    let rule = tree.walk_rules().next().unwrap();
    let copy = tree.clone_subtree(rule);
    let mut out = String::new();
    Stringifier::new()
        .stringify_node(
            &tree,
            copy,
            &mut |text: &str, _: Option<NodeId>, _: Option<Boundary>| out.push_str(text),
        )
        .unwrap();
    assert_eq!(out, "a {\n  color: red;\n}");
}

#[test]
fn test_generic_dialect_nodes() {
    let mut tree = Tree::empty();
    let root = tree.root();
    let variable = tree.create(NodeKind::other("variable", "$size:", "4px"));
    tree[variable].raws.between = Some(" ".into());
    let mixin = tree.create(NodeKind::other("mixin", "@mixin big", ""));
    tree.open_block(mixin).unwrap();
    let decl = tree.create(NodeKind::decl("width", "100%"));
    tree.append(root, variable).unwrap();
    tree.append(root, mixin).unwrap();
    tree.append(mixin, decl).unwrap();
    tree[variable].raws.set("scss.inline", "//");

    assert_eq!(
        print(&tree),
        "$size: 4px;\n@mixin big {\n  width: 100%\n}"
    );
}

#[test]
fn test_strict_rejects_unknown_kinds() {
    let mut tree = Tree::empty();
    let root = tree.root();
    let node = tree.create(NodeKind::other("mixin", "@mixin big", ""));
    tree.append(root, node).unwrap();

    let err = Stringifier::new().strict(true).to_string(&tree).unwrap_err();
    let StringifyError::UnknownNodeType { kind, node: at, .. } = &err;
    assert_eq!(kind, "mixin");
    assert_eq!(*at, node);
    assert_eq!(err.to_string(), "no renderer for node type `mixin` (#1)");
}

fn render_variable(
    cx: &mut RenderContext<'_, '_>,
    id: NodeId,
    semicolon: bool,
) -> Result<(), StringifyError> {
    let node = &cx.tree()[id];
    let mut text = format!("${}: {}", node.head().unwrap_or_default(), node.value().unwrap_or_default());
    if semicolon {
        text.push(';');
    }
    cx.push(&text, Some(id), None);
    Ok(())
}

#[test]
fn test_registered_renderer() {
    // Nothing in the document shows where a dialect node goes, so it gets
    // the default line break.
    let mut tree = strict("a { color: red; }");
    let rule = tree.walk_rules().next().unwrap();
    let variable = tree.create(NodeKind::other("variable", "size", "4px"));
    tree.prepend(rule, variable).unwrap();

    let stringifier = Stringifier::new()
        .strict(true)
        .register("variable", render_variable);
    assert_eq!(
        stringifier.to_string(&tree).unwrap(),
        "a {\n  $size: 4px; color: red; }"
    );
}

#[test]
fn test_mapping_builder() {
    let source = "a {\n  color: red;\n}";
    let tree = strict(source);
    let mut builder = MappingBuilder::new(&tree);
    stringify(&tree, &mut builder).unwrap();
    let (css, attributions) = builder.finish();
    assert_eq!(css, source);

    let rule = tree.walk_rules().next().unwrap();
    let decl = tree.walk_decls().next().unwrap();
    let at = |line, column| (line, column);
    let summary: Vec<_> = attributions
        .iter()
        .filter(|a| a.node != tree.root())
        .map(|a| {
            (
                a.node,
                a.boundary,
                at(a.generated.line, a.generated.column),
                a.original.map(|p| at(p.line, p.column)),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (rule, Some(Boundary::Start), (1, 1), Some((1, 1))),
            (decl, None, (2, 3), Some((2, 3))),
            (rule, Some(Boundary::End), (3, 1), Some((3, 1))),
        ]
    );
    let decl_attribution = attributions.iter().find(|a| a.node == decl).unwrap();
    assert_eq!(
        decl_attribution.generated,
        Position {
            line: 2,
            column: 3,
            offset: 6,
        }
    );
}

#[test]
fn test_synthesized_nodes_have_no_original() {
    let mut tree = Tree::empty();
    let root = tree.root();
    let comment = tree.create(NodeKind::comment("x"));
    tree.append(root, comment).unwrap();
    let mut builder = MappingBuilder::new(&tree);
    stringify(&tree, &mut builder).unwrap();
    let attribution = builder
        .attributions()
        .iter()
        .find(|a| a.node == comment)
        .unwrap();
    assert_eq!(attribution.original, None);
    assert_eq!(builder.css(), "/* x */");
}

#[test]
fn test_tolerant_tree_prints() {
    init_tracing();
    let tree = parse("a { color: red", &ParseOptions::new().tolerant()).unwrap();
    assert_eq!(print(&tree), "a { color: red}");
}
