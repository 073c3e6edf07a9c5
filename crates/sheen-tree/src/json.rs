//! JSON views of a tree, for debugging and snapshot tests.

use serde_json::{Map, Value, json};

use crate::node::{Node, NodeKind};
use crate::raws::{RawValue, Raws};
use crate::tree::{NodeId, Tree};

impl Tree {
    /// The subtree at `id` as JSON, raws and source positions included.
    pub fn to_json(&self, id: NodeId) -> Value {
        node_to_json(self, id, true)
    }

    /// The subtree at `id` as JSON, with only semantic properties.
    ///
    /// Two trees that differ only in formatting give equal values.
    pub fn to_semantic_json(&self, id: NodeId) -> Value {
        node_to_json(self, id, false)
    }
}

fn node_to_json(tree: &Tree, id: NodeId, full: bool) -> Value {
    let node = tree.node(id);
    let mut map = Map::new();
    map.insert("type".into(), json!(node.node_type().as_str()));
    kind_to_json(node.kind(), &mut map);

    if node.has_block() {
        let nodes: Vec<Value> = node
            .children()
            .iter()
            .map(|&child| node_to_json(tree, child, full))
            .collect();
        map.insert("nodes".into(), json!(nodes));
    }

    if full {
        map.insert("raws".into(), raws_to_json(&node.raws));
        if let Some(source) = source_to_json(node) {
            map.insert("source".into(), source);
        }
    }
    Value::Object(map)
}

fn kind_to_json(kind: &NodeKind, map: &mut Map<String, Value>) {
    match kind {
        NodeKind::Root => {}
        NodeKind::AtRule { name, params } => {
            map.insert("name".into(), json!(name));
            map.insert("params".into(), json!(params));
        }
        NodeKind::Rule { selector } => {
            map.insert("selector".into(), json!(selector));
        }
        NodeKind::Declaration {
            prop,
            value,
            important,
        } => {
            map.insert("prop".into(), json!(prop));
            map.insert("value".into(), json!(value));
            if *important {
                map.insert("important".into(), json!(true));
            }
        }
        NodeKind::Comment { text } => {
            map.insert("text".into(), json!(text));
        }
        NodeKind::Other { name, head, value } => {
            map.insert("name".into(), json!(name));
            map.insert("head".into(), json!(head));
            map.insert("value".into(), json!(value));
        }
    }
}

fn raws_to_json(raws: &Raws) -> Value {
    let mut map = Map::new();
    let mut text = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            map.insert(key.into(), json!(value));
        }
    };
    text("before", &raws.before);
    text("after", &raws.after);
    text("between", &raws.between);
    text("afterName", &raws.after_name);
    text("left", &raws.left);
    text("right", &raws.right);
    text("important", &raws.important);
    text("ownSemicolon", &raws.own_semicolon);

    if let Some(semicolon) = raws.semicolon {
        map.insert("semicolon".into(), json!(semicolon));
    }
    for (key, raw) in [
        ("selector", &raws.selector),
        ("value", &raws.value),
        ("params", &raws.params),
    ] {
        if let Some(RawValue { value, raw }) = raw {
            map.insert(key.into(), json!({ "value": value, "raw": raw }));
        }
    }
    if !raws.damage.is_empty() {
        let damage: Vec<&str> = raws.damage.iter().map(|d| d.as_str()).collect();
        map.insert("damage".into(), json!(damage));
    }
    for (key, value) in &raws.extra {
        map.insert(key.clone(), json!(value));
    }
    Value::Object(map)
}

fn source_to_json(node: &Node) -> Option<Value> {
    let source = node.source.as_ref()?;
    let point = |p: &crate::input::Position| {
        json!({ "line": p.line, "column": p.column, "offset": p.offset })
    };
    let mut map = Map::new();
    map.insert("start".into(), point(&source.start));
    if let Some(end) = &source.end {
        map.insert("end".into(), point(end));
    }
    if let Some(from) = source.input.from() {
        map.insert("from".into(), json!(from));
    }
    Some(Value::Object(map))
}
