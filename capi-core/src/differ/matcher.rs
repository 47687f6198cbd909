//! Identity matching of declarations across versions.
//!
//! Nodes are keyed by `name-Kind`. Anonymous members get positional
//! placeholder names; anonymous file-scope aggregates are keyed by their
//! type text. Iteration follows old insertion order, then new-only keys.

use std::collections::HashMap;

use crate::types::{Node, NodeKind};

const PLACEHOLDER_PREFIX: &str = "temporary_name";

/// Reconciliation key for a named node.
pub fn node_key(name: &str, kind: NodeKind) -> String {
    format!("{}-{}", name, kind.as_str())
}

/// Nodes of one scope in insertion order. The first node wins a key.
#[derive(Debug, Default)]
pub struct KeyedNodes<'a> {
    order: Vec<String>,
    by_key: HashMap<String, &'a Node>,
}

impl<'a> KeyedNodes<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key is taken. Returns whether the node was kept.
    pub fn insert(&mut self, key: String, node: &'a Node) -> bool {
        if self.by_key.contains_key(&key) {
            return false;
        }
        self.order.push(key.clone());
        self.by_key.insert(key, node);
        true
    }

    pub fn get(&self, key: &str) -> Option<&'a Node> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Members of a struct, union or enum.
    pub fn members(nodes: &'a [Node]) -> Self {
        let mut keyed = Self::new();
        let mut anonymous = 0usize;
        for node in nodes {
            let key = if node.name.is_empty() {
                let placeholder = format!("{}{}", PLACEHOLDER_PREFIX, anonymous);
                anonymous += 1;
                node_key(&placeholder, node.kind)
            } else {
                node_key(&node.name, node.kind)
            };
            keyed.insert(key, node);
        }
        keyed
    }

    /// The translation unit and its top-level declarations.
    ///
    /// Constants of an anonymous enum declared in this file are matched
    /// individually; other anonymous aggregates are matched by type text.
    pub fn file_scope(unit: &'a Node) -> Self {
        let mut keyed = Self::new();
        keyed.insert(node_key(&unit.name, unit.kind), unit);

        let file = unit.location.file_name();
        for child in &unit.children {
            if !child.name.is_empty() {
                keyed.insert(node_key(&child.name, child.kind), child);
                continue;
            }
            let own_type = child.type_signature.contains(file);
            match child.kind {
                NodeKind::Enum if own_type => {
                    for constant in &child.children {
                        keyed.insert(format!("{}-{}", file, constant.name), constant);
                    }
                }
                NodeKind::Enum if !child.children.is_empty() => {
                    keyed.insert(format!("{}-{}", file, child.type_signature), child);
                }
                NodeKind::Struct | NodeKind::Union if !own_type => {
                    keyed.insert(format!("{}-{}", file, child.type_signature), child);
                }
                _ => {}
            }
        }
        keyed
    }
}

/// Outcome of matching one key across versions.
#[derive(Clone, Copy, Debug)]
pub enum Pairing<'a> {
    Matched(&'a Node, &'a Node),
    Removed(&'a Node),
    Added(&'a Node),
}

/// Pair old and new nodes by key.
pub fn reconcile<'a>(old: &KeyedNodes<'a>, new: &KeyedNodes<'a>) -> Vec<Pairing<'a>> {
    let mut pairings = Vec::with_capacity(old.len().max(new.len()));
    for key in old.keys() {
        let Some(old_node) = old.get(key) else { continue };
        match new.get(key) {
            Some(new_node) => pairings.push(Pairing::Matched(old_node, new_node)),
            None => pairings.push(Pairing::Removed(old_node)),
        }
    }
    for key in new.keys() {
        if old.contains(key) {
            continue;
        }
        if let Some(new_node) = new.get(key) {
            pairings.push(Pairing::Added(new_node));
        }
    }
    pairings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field(name: &str) -> Node {
        Node::new(NodeKind::Field, name).with_type("int")
    }

    fn make_unit(children: Vec<Node>) -> Node {
        Node::new(NodeKind::TranslationUnit, "include/a.h")
            .at("include/a.h", 1, 1)
            .with_children(children)
    }

    fn describe(pairings: &[Pairing]) -> Vec<String> {
        pairings
            .iter()
            .map(|p| match p {
                Pairing::Matched(o, _) => format!("={}", o.name),
                Pairing::Removed(o) => format!("-{}", o.name),
                Pairing::Added(n) => format!("+{}", n.name),
            })
            .collect()
    }

    #[test]
    fn test_reconcile_order() {
        let old = vec![make_field("a"), make_field("b"), make_field("c")];
        let new = vec![make_field("d"), make_field("c"), make_field("a")];
        let pairings = reconcile(&KeyedNodes::members(&old), &KeyedNodes::members(&new));
        assert_eq!(describe(&pairings), vec!["=a", "-b", "=c", "+d"]);
    }

    #[test]
    fn test_first_node_wins_key() {
        let nodes = vec![make_field("a").with_type("int"), make_field("a").with_type("long")];
        let keyed = KeyedNodes::members(&nodes);
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed.get("a-Field").unwrap().type_signature, "int");
    }

    #[test]
    fn test_anonymous_members_get_placeholders() {
        let nodes = vec![
            Node::new(NodeKind::Struct, "").with_type("struct (anonymous at include/a.h:2:5)"),
            Node::new(NodeKind::Struct, "").with_type("struct (anonymous at include/a.h:5:5)"),
        ];
        let keyed = KeyedNodes::members(&nodes);
        let keys: Vec<&str> = keyed.keys().collect();
        assert_eq!(keys, vec!["temporary_name0-Struct", "temporary_name1-Struct"]);
    }

    #[test]
    fn test_same_name_different_kind_do_not_match() {
        let old = vec![Node::new(NodeKind::Struct, "Foo")];
        let new = vec![Node::new(NodeKind::Typedef, "Foo")];
        let pairings = reconcile(&KeyedNodes::members(&old), &KeyedNodes::members(&new));
        assert_eq!(describe(&pairings), vec!["-Foo", "+Foo"]);
    }

    #[test]
    fn test_file_scope_flattens_anonymous_enum() {
        let anon_enum = Node::new(NodeKind::Enum, "")
            .with_type("enum (anonymous at include/a.h:3:1)")
            .with_children(vec![
                Node::new(NodeKind::EnumConstant, "A"),
                Node::new(NodeKind::EnumConstant, "B"),
            ]);
        let unit = make_unit(vec![Node::new(NodeKind::Function, "OH_Foo"), anon_enum]);
        let keyed = KeyedNodes::file_scope(&unit);
        let keys: Vec<&str> = keyed.keys().collect();
        assert_eq!(
            keys,
            vec!["include/a.h-TranslationUnit", "OH_Foo-Function", "a.h-A", "a.h-B"]
        );
    }

    #[test]
    fn test_file_scope_keys_foreign_anonymous_by_type() {
        let foreign = Node::new(NodeKind::Struct, "").with_type("Config");
        let own = Node::new(NodeKind::Struct, "").with_type("struct (anonymous at include/a.h:9:1)");
        let unit = make_unit(vec![foreign, own]);
        let keyed = KeyedNodes::file_scope(&unit);
        assert!(keyed.contains("a.h-Config"));
        assert_eq!(keyed.len(), 2);
    }
}
