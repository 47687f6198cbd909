//! Data models for parsed header declarations.
//!
//! These types represent the normalized declaration tree of a C header,
//! the shape every [`AstProvider`](crate::parser::AstProvider) emits and
//! every differ consumes.

use serde::{Deserialize, Serialize};

/// Sentinel used in change records when one side is absent.
pub const NA: &str = "NA";

/// The closed set of declaration kinds a header tree can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    TranslationUnit,
    Function,
    Macro,
    Struct,
    Union,
    Enum,
    Typedef,
    Variable,
    Field,
    Param,
    EnumConstant,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnit => "TranslationUnit",
            NodeKind::Function => "Function",
            NodeKind::Macro => "Macro",
            NodeKind::Struct => "Struct",
            NodeKind::Union => "Union",
            NodeKind::Enum => "Enum",
            NodeKind::Typedef => "Typedef",
            NodeKind::Variable => "Variable",
            NodeKind::Field => "Field",
            NodeKind::Param => "Param",
            NodeKind::EnumConstant => "EnumConstant",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnit => "NA",
            NodeKind::Function => "function",
            NodeKind::Macro => "macro",
            NodeKind::Struct => "struct",
            NodeKind::Union => "union",
            NodeKind::Enum => "enum",
            NodeKind::Typedef => "typedef",
            NodeKind::Variable => "variable/constant",
            NodeKind::Field => "struct/union member",
            NodeKind::Param => "parameter",
            NodeKind::EnumConstant => "enum constant",
        }
    }

    /// Struct, union and enum declarations.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, NodeKind::Struct | NodeKind::Union | NodeKind::Enum)
    }
}

/// Source position of a declaration. Paths are relative to the scanned root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.path)
    }
}

/// Who owns an API, derived from its name prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiSource {
    Open,
    Closed,
    ThirdParty,
    #[default]
    NotApplicable,
}

impl ApiSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiSource::Open => "open",
            ApiSource::Closed => "closed",
            ApiSource::ThirdParty => "third_party",
            ApiSource::NotApplicable => "NA",
        }
    }
}

/// One declaration or sub-declaration of a header file.
///
/// `children` holds parameters for functions, members for structs, unions
/// and enums, the inline aggregate of a typedef, and top-level items for a
/// translation unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub name: String,
    pub type_signature: String,
    pub location: Location,
    /// Raw doc comment; `None` when the declaration has none.
    pub comment: Option<String>,
    /// Line where the doc comment starts.
    pub comment_line: u32,
    /// Normalized source text of the declaration.
    pub content: String,
    pub return_type: Option<String>,
    /// Enum constant value, variable initializer or macro replacement text.
    pub value: Option<String>,
    pub is_extern: bool,
    pub is_const: bool,
    pub children: Vec<Node>,
    pub kit_name: String,
    pub sub_system: String,
    pub class_name: String,
    pub unique_id: String,
    pub is_system_api: bool,
    pub api_source: ApiSource,
    /// Only set on translation units.
    pub syntax_error: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            type_signature: String::new(),
            location: Location::default(),
            comment: None,
            comment_line: 0,
            content: String::new(),
            return_type: None,
            value: None,
            is_extern: false,
            is_const: false,
            children: Vec::new(),
            kit_name: String::new(),
            sub_system: String::new(),
            class_name: String::new(),
            unique_id: String::new(),
            is_system_api: false,
            api_source: ApiSource::NotApplicable,
            syntax_error: None,
        }
    }

    pub fn with_type(mut self, type_signature: impl Into<String>) -> Self {
        self.type_signature = type_signature.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn at(mut self, path: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Location::new(path, line, column);
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    /// Name used when reporting: the type text for anonymous aggregates.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() && self.kind.is_aggregate() {
            &self.type_signature
        } else {
            &self.name
        }
    }

    /// Declaration text shown in reports.
    pub fn declaration(&self) -> &str {
        match self.kind {
            NodeKind::Struct | NodeKind::Union | NodeKind::Enum | NodeKind::Typedef => {
                &self.type_signature
            }
            _ if !self.content.is_empty() => &self.content,
            _ => &self.name,
        }
    }

    /// This node and all descendants, depth first.
    pub fn walk(&self) -> Vec<&Node> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// Maps a header path prefix to kit and subsystem names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitMapping {
    pub path: String,
    #[serde(default)]
    pub kit: String,
    #[serde(default)]
    pub subsystem: String,
}

/// A syntax problem the provider reported for one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxError {
    pub file: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_for_anonymous_aggregate() {
        let node = Node::new(NodeKind::Struct, "")
            .with_type("struct (anonymous at a.h:3:9)");
        assert_eq!(node.display_name(), "struct (anonymous at a.h:3:9)");

        let node = Node::new(NodeKind::Function, "OH_Foo");
        assert_eq!(node.display_name(), "OH_Foo");
    }

    #[test]
    fn test_declaration_text() {
        let func = Node::new(NodeKind::Function, "OH_Foo").with_content("int OH_Foo(int a)");
        assert_eq!(func.declaration(), "int OH_Foo(int a)");

        let st = Node::new(NodeKind::Struct, "S").with_type("struct S");
        assert_eq!(st.declaration(), "struct S");

        let bare = Node::new(NodeKind::Macro, "FOO");
        assert_eq!(bare.declaration(), "FOO");
    }

    #[test]
    fn test_location_file_name() {
        let loc = Location::new("include/net/socket.h", 1, 1);
        assert_eq!(loc.file_name(), "socket.h");
    }

    #[test]
    fn test_walk_visits_descendants() {
        let tu = Node::new(NodeKind::TranslationUnit, "a.h").with_children(vec![
            Node::new(NodeKind::Struct, "S")
                .with_children(vec![Node::new(NodeKind::Field, "a")]),
            Node::new(NodeKind::Macro, "M"),
        ]);
        let names: Vec<&str> = tu.walk().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["a.h", "S", "a", "M"]);
    }
}
