//! Helper functions for tree-sitter AST navigation.

use tree_sitter::Node;

/// Get the text content of a node.
pub fn get_node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    if start < source.len() && end <= source.len() && start < end {
        &source[start..end]
    } else {
        ""
    }
}

/// Find the first child of a specific type.
#[allow(clippy::manual_find)]
pub fn find_child_by_type<'a>(node: &Node<'a>, type_name: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == type_name {
            return Some(child);
        }
    }
    None
}

/// Whether any leaf token under `node` spells `token`.
pub fn has_token(node: &Node, source: &str, token: &str) -> bool {
    if node.child_count() == 0 {
        return get_node_text(node, source) == token;
    }
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| has_token(&child, source, token));
    found
}

/// Get line number (1-indexed) from a node.
pub fn get_start_line(node: &Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// Get column number (1-indexed) from a node.
pub fn get_start_column(node: &Node) -> u32 {
    node.start_position().column as u32 + 1
}

/// Collapse every whitespace run to a single space.
pub fn normalize_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Line number (1-indexed) of a byte offset.
pub fn line_at(source: &str, offset: usize) -> u32 {
    let end = offset.min(source.len());
    bytecount::count(&source.as_bytes()[..end], b'\n') as u32 + 1
}
