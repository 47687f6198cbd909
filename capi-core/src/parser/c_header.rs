//! C header extractor using tree-sitter.
//!
//! Produces the normalized declaration tree for one header. Anonymous
//! aggregates are labelled the way a C front end spells them
//! (`struct (anonymous at path:line:col)`) so that member type checks can
//! recognize types declared in the same file.

use std::borrow::Cow;
use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node as TsNode, Parser};

use super::helpers::{
    find_child_by_type, get_node_text, get_start_column, get_start_line, has_token, line_at,
    normalize_ws,
};
use super::AstProvider;
use crate::error::{CapiError, Result};
use crate::types::{ApiSource, Node, NodeKind};

static CLOSED_API: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^HMS_").unwrap());
static OPEN_API: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(OH_|ffrt|tee)").unwrap());
static KIT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"@kit[ \t]+([^\s*]+)").unwrap());
static GROUP_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*\*\s*@\}\s*\*/").unwrap());

const MAX_SYNTAX_ERRORS: usize = 20;

/// AST provider backed by the tree-sitter C grammar.
#[derive(Clone, Copy, Debug, Default)]
pub struct CHeaderProvider;

impl AstProvider for CHeaderProvider {
    fn parse(&self, source: &str, path: &str) -> Result<Node> {
        parse(source, path)
    }
}

/// Parse C header source into a translation-unit node.
pub fn parse(source: &str, path: &str) -> Result<Node> {
    let source = mask_cplusplus_guards(source);
    let source = source.as_ref();

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c::LANGUAGE.into())
        .map_err(|e| CapiError::Parse {
            path: path.to_string(),
            message: format!("Failed to set C language: {}", e),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| CapiError::Parse {
        path: path.to_string(),
        message: "Failed to parse C source".to_string(),
    })?;
    let root = tree.root_node();

    let extractor = Extractor { source, path };
    let mut unit = Node::new(NodeKind::TranslationUnit, path).at(path, 1, 1);
    if let Some((comment, line)) = extractor.file_comment(&root) {
        unit.comment = Some(comment);
        unit.comment_line = line;
    }
    unit.children = extractor.items(&root);
    unit.syntax_error = extractor.syntax_errors(&root);

    annotate(&mut unit, None);
    Ok(unit)
}

/// Blank out `#ifdef __cplusplus` sections, keeping offsets and line breaks.
///
/// The `extern "C" {` / `}` pair split across two guarded sections cannot be
/// parsed as C.
pub fn mask_cplusplus_guards(source: &str) -> Cow<'_, str> {
    if !source.contains("__cplusplus") {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len());
    let mut depth = 0usize;
    for line in source.split_inclusive('\n') {
        let directive = line.trim_start();
        let opens = directive.starts_with("#if");
        if depth == 0 && opens && directive.contains("__cplusplus") {
            depth = 1;
        } else if depth > 0 {
            if opens {
                depth += 1;
            } else if directive.starts_with("#endif") {
                depth -= 1;
            }
        } else {
            out.push_str(line);
            continue;
        }
        out.extend(line.chars().map(|c| if c == '\n' || c == '\r' { c } else { ' ' }));
    }
    Cow::Owned(out)
}

struct Extractor<'a> {
    source: &'a str,
    path: &'a str,
}

/// A doc comment waiting for the declaration that follows it.
#[derive(Clone)]
struct PendingDoc {
    text: String,
    line: u32,
    line_style: bool,
}

impl<'a> Extractor<'a> {
    fn text(&self, node: &TsNode) -> &'a str {
        get_node_text(node, self.source)
    }

    /// Header comment: every `/** */` block before the first item, plus one
    /// closing-group comment for each found later in the file.
    fn file_comment(&self, root: &TsNode) -> Option<(String, u32)> {
        let mut blocks = Vec::new();
        let mut first_line = 0;
        let mut header_end = 0;
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            if child.kind() != "comment" {
                break;
            }
            header_end = child.end_byte();
            let text = self.text(&child);
            if text.starts_with("/**") {
                if blocks.is_empty() {
                    first_line = get_start_line(&child);
                }
                blocks.push(text.to_string());
            }
        }

        let closing = GROUP_CLOSE
            .find_iter(self.source)
            .filter(|m| m.start() >= header_end)
            .count();
        if blocks.is_empty() && closing == 0 {
            return None;
        }
        for _ in 0..closing {
            blocks.push("/** @} */".to_string());
        }
        if first_line == 0 {
            first_line = 1;
        }
        Some((blocks.join("\n"), first_line))
    }

    /// Top-level items of a translation unit or preprocessor block.
    fn items(&self, container: &TsNode) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pending: Option<PendingDoc> = None;
        let mut cursor = container.walk();
        for child in container.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {
                    self.track_comment(&child, &mut pending);
                }
                "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif"
                | "preproc_elifdef" | "linkage_specification" | "declaration_list" => {
                    out.extend(self.items(&child));
                    pending = None;
                }
                "preproc_def" | "preproc_function_def" => {
                    out.push(self.macro_node(&child, pending.take()));
                }
                "declaration" | "function_definition" => {
                    out.extend(self.declaration(&child, pending.take()));
                }
                "type_definition" => {
                    out.extend(self.typedef(&child, pending.take()));
                }
                "struct_specifier" | "union_specifier" | "enum_specifier" => {
                    if has_body(&child) {
                        out.push(self.aggregate(&child, pending.take(), None));
                    } else {
                        pending = None;
                    }
                }
                _ => {
                    pending = None;
                }
            }
        }
        out
    }

    fn track_comment(&self, node: &TsNode, pending: &mut Option<PendingDoc>) {
        let text = self.text(node);
        if text.starts_with("///") {
            if let Some(doc) = pending.as_mut().filter(|d| d.line_style) {
                doc.text.push('\n');
                doc.text.push_str(text);
                return;
            }
            *pending = Some(PendingDoc {
                text: text.to_string(),
                line: get_start_line(node),
                line_style: true,
            });
        } else if text.starts_with("/**") && text != "/**/" {
            *pending = Some(PendingDoc {
                text: text.to_string(),
                line: get_start_line(node),
                line_style: false,
            });
        }
    }

    fn base_node(&self, kind: NodeKind, name: &str, at: &TsNode, doc: Option<PendingDoc>) -> Node {
        let mut node =
            Node::new(kind, name).at(self.path, get_start_line(at), get_start_column(at));
        // Variables and functions are decided by their storage class.
        node.is_extern = !matches!(kind, NodeKind::Variable);
        if let Some(doc) = doc {
            node.comment = Some(doc.text);
            node.comment_line = doc.line;
        }
        node
    }

    fn macro_node(&self, node: &TsNode, doc: Option<PendingDoc>) -> Node {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(&n))
            .unwrap_or_default();
        let params = node
            .child_by_field_name("parameters")
            .map(|n| normalize_ws(self.text(&n)));
        let value = node
            .child_by_field_name("value")
            .map(|n| normalize_ws(self.text(&n)))
            .filter(|v| !v.is_empty());

        let text = match (&params, &value) {
            (Some(p), Some(v)) => Some(format!("{} {}", p, v)),
            (Some(p), None) => Some(p.clone()),
            (None, v) => v.clone(),
        };

        let mut out = self.base_node(NodeKind::Macro, name, node, doc);
        out.content = normalize_ws(&format!(
            "{}{} {}",
            name,
            params.as_deref().unwrap_or(""),
            value.as_deref().unwrap_or("")
        ));
        out.value = text;
        out
    }

    /// Declarations and function definitions: functions, variables and any
    /// aggregate defined inline in the type.
    fn declaration(&self, node: &TsNode, doc: Option<PendingDoc>) -> Vec<Node> {
        let mut out = Vec::new();
        let type_node = node.child_by_field_name("type");
        if let Some(t) = type_node.filter(|t| is_aggregate_specifier(t) && has_body(t)) {
            out.push(self.aggregate(&t, None, None));
        }

        let specifiers = self.specifier_text(node, None);
        let is_static = has_token(node, self.source, "static") || has_token(node, self.source, "deprecated");
        let is_extern = has_token(node, self.source, "extern");
        let is_const = has_token(node, self.source, "const");

        let mut cursor = node.walk();
        let declarators: Vec<TsNode> = node.children_by_field_name("declarator", &mut cursor).collect();
        for declarator in declarators {
            let mut item = match function_declarator(&declarator) {
                Some(func) => self.function_node(node, &declarator, &func, &specifiers, doc.clone()),
                None => self.variable_node(node, &declarator, &specifiers, doc.clone()),
            };
            if item.kind == NodeKind::Variable {
                item.is_extern = is_extern;
                item.is_const = is_const;
            } else {
                item.is_extern = !is_static;
            }
            out.push(item);
        }
        out
    }

    fn function_node(
        &self,
        decl: &TsNode,
        declarator: &TsNode,
        func: &TsNode,
        specifiers: &str,
        doc: Option<PendingDoc>,
    ) -> Node {
        let name_node = declarator_name(func);
        let name = name_node.map(|n| self.text(&n)).unwrap_or_default();

        let stars = pointer_depth(declarator, func);
        let return_type = if stars > 0 {
            format!("{} {}", specifiers, "*".repeat(stars))
        } else {
            specifiers.to_string()
        };

        let params = func
            .child_by_field_name("parameters")
            .map(|list| self.params(&list, name))
            .unwrap_or_default();
        let param_types: Vec<&str> = params.iter().map(|p| p.type_signature.as_str()).collect();

        let at = name_node.unwrap_or(*decl);
        let mut node = self.base_node(NodeKind::Function, name, &at, doc);
        node.location.line = get_start_line(decl);
        node.content = normalize_ws(&self.source[decl.start_byte()..declarator.end_byte()]);
        node.type_signature = format!("{} ({})", return_type, param_types.join(", "));
        node.return_type = Some(return_type);
        node.children = params;
        node
    }

    fn params(&self, list: &TsNode, function: &str) -> Vec<Node> {
        let mut out = Vec::new();
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" => {
                    let declarator = child.child_by_field_name("declarator");
                    let specifiers = self.specifier_text(&child, None);
                    if declarator.is_none() && specifiers == "void" {
                        continue;
                    }
                    let name_node = declarator.and_then(|d| declarator_name(&d));
                    let name = name_node.map(|n| self.text(&n)).unwrap_or_default();
                    let mut param = self.base_node(NodeKind::Param, name, &child, None);
                    param.type_signature = self.type_text(&specifiers, declarator, name_node);
                    param.content = normalize_ws(self.text(&child));
                    param.class_name = function.to_string();
                    out.push(param);
                }
                "variadic_parameter" => {
                    let mut param = self.base_node(NodeKind::Param, "...", &child, None);
                    param.type_signature = "...".to_string();
                    param.content = "...".to_string();
                    out.push(param);
                }
                _ => {}
            }
        }
        out
    }

    fn variable_node(
        &self,
        decl: &TsNode,
        declarator: &TsNode,
        specifiers: &str,
        doc: Option<PendingDoc>,
    ) -> Node {
        let (inner, value) = if declarator.kind() == "init_declarator" {
            (
                declarator.child_by_field_name("declarator"),
                declarator
                    .child_by_field_name("value")
                    .map(|v| normalize_ws(self.text(&v))),
            )
        } else {
            (Some(*declarator), None)
        };
        let name_node = inner.and_then(|d| declarator_name(&d));
        let name = name_node.map(|n| self.text(&n)).unwrap_or_default();

        let mut node = self.base_node(NodeKind::Variable, name, decl, doc);
        node.type_signature = self.type_text(specifiers, inner, name_node);
        node.content = normalize_ws(&self.source[decl.start_byte()..declarator.end_byte()]);
        node.value = value;
        node
    }

    fn typedef(&self, node: &TsNode, doc: Option<PendingDoc>) -> Vec<Node> {
        let mut out = Vec::new();
        let type_node = node.child_by_field_name("type");
        let mut cursor = node.walk();
        let declarators: Vec<TsNode> = node.children_by_field_name("declarator", &mut cursor).collect();
        let first_name = declarators
            .first()
            .and_then(declarator_name)
            .map(|n| self.text(&n));

        let mut inline = None;
        if let Some(t) = type_node.filter(|t| is_aggregate_specifier(t) && has_body(t)) {
            if t.child_by_field_name("name").is_some() {
                out.push(self.aggregate(&t, None, None));
            } else {
                inline = Some(self.aggregate(&t, None, first_name));
            }
        }

        let specifiers = self.specifier_text(node, first_name);
        for declarator in declarators {
            let name_node = declarator_name(&declarator);
            let name = name_node.map(|n| self.text(&n)).unwrap_or_default();
            let mut item = self.base_node(NodeKind::Typedef, name, node, doc.clone());
            item.type_signature = self.type_text(&specifiers, Some(declarator), name_node);
            item.content = normalize_ws(&format!("typedef {} {}", specifiers, self.text(&declarator)));
            if let Some(child) = inline.take() {
                item.children.push(child);
            }
            out.push(item);
        }
        out
    }

    /// Struct, union or enum with a body.
    fn aggregate(&self, spec: &TsNode, doc: Option<PendingDoc>, typedef_name: Option<&str>) -> Node {
        let kind = match spec.kind() {
            "union_specifier" => NodeKind::Union,
            "enum_specifier" => NodeKind::Enum,
            _ => NodeKind::Struct,
        };
        let name = spec
            .child_by_field_name("name")
            .map(|n| self.text(&n))
            .unwrap_or_default();

        let mut node = self.base_node(kind, name, spec, doc);
        node.type_signature = self.aggregate_label(spec, typedef_name);
        node.content = node.type_signature.clone();
        if let Some(body) = spec.child_by_field_name("body") {
            node.children = match kind {
                NodeKind::Enum => self.enumerators(&body, &node.type_signature),
                _ => self.fields(&body),
            };
        }
        node
    }

    fn aggregate_label(&self, spec: &TsNode, typedef_name: Option<&str>) -> String {
        let keyword = match spec.kind() {
            "union_specifier" => "union",
            "enum_specifier" => "enum",
            _ => "struct",
        };
        match spec.child_by_field_name("name") {
            Some(name) => format!("{} {}", keyword, self.text(&name)),
            None => match typedef_name {
                Some(alias) => alias.to_string(),
                None => format!(
                    "{} (anonymous at {}:{}:{})",
                    keyword,
                    self.path,
                    get_start_line(spec),
                    get_start_column(spec)
                ),
            },
        }
    }

    fn fields(&self, body: &TsNode) -> Vec<Node> {
        let mut out = Vec::new();
        let mut pending: Option<PendingDoc> = None;
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "comment" => self.track_comment(&child, &mut pending),
                "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif" => {
                    out.extend(self.fields(&child));
                    pending = None;
                }
                "field_declaration" => {
                    out.extend(self.field_declaration(&child, pending.take()));
                }
                _ => pending = None,
            }
        }
        out
    }

    fn field_declaration(&self, node: &TsNode, doc: Option<PendingDoc>) -> Vec<Node> {
        let mut out = Vec::new();
        if let Some(t) = node
            .child_by_field_name("type")
            .filter(|t| is_aggregate_specifier(t) && has_body(t))
        {
            out.push(self.aggregate(&t, doc.clone(), None));
        }

        let specifiers = self.specifier_text(node, None);
        let bitfield = find_child_by_type(node, "bitfield_clause").map(|b| normalize_ws(self.text(&b)));
        let mut cursor = node.walk();
        let declarators: Vec<TsNode> = node.children_by_field_name("declarator", &mut cursor).collect();
        for declarator in declarators {
            let name_node = declarator_name(&declarator);
            let name = name_node.map(|n| self.text(&n)).unwrap_or_default();
            let mut field = self.base_node(NodeKind::Field, name, node, doc.clone());
            field.type_signature = self.type_text(&specifiers, Some(declarator), name_node);
            let mut content = format!("{} {}", specifiers, self.text(&declarator));
            if let Some(bits) = &bitfield {
                content.push(' ');
                content.push_str(bits);
            }
            field.content = normalize_ws(&content);
            out.push(field);
        }
        out
    }

    fn enumerators(&self, body: &TsNode, enum_type: &str) -> Vec<Node> {
        let mut out = Vec::new();
        let mut counter = EnumCounter::new();
        self.collect_enumerators(body, enum_type, &mut counter, &mut out);
        out
    }

    fn collect_enumerators(
        &self,
        body: &TsNode,
        enum_type: &str,
        counter: &mut EnumCounter,
        out: &mut Vec<Node>,
    ) {
        let mut pending: Option<PendingDoc> = None;
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "comment" => self.track_comment(&child, &mut pending),
                "preproc_ifdef" | "preproc_if" | "preproc_else" | "preproc_elif" => {
                    self.collect_enumerators(&child, enum_type, counter, out);
                    pending = None;
                }
                "enumerator" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.text(&n))
                        .unwrap_or_default();
                    let value = match child.child_by_field_name("value") {
                        Some(expr) => {
                            let number = self.eval_const(&expr, &counter.known);
                            let text = normalize_ws(self.text(&expr));
                            counter.assign(name, Some((text.as_str(), number)))
                        }
                        None => counter.assign(name, None),
                    };

                    let mut constant = self.base_node(NodeKind::EnumConstant, name, &child, pending.take());
                    constant.type_signature = enum_type.to_string();
                    constant.content = normalize_ws(self.text(&child));
                    constant.value = Some(value);
                    out.push(constant);
                }
                _ => pending = None,
            }
        }
    }

    /// Value of an integer constant expression. `None` when it uses anything
    /// besides literals, casts, integer operators and constants in `known`.
    fn eval_const(&self, node: &TsNode, known: &HashMap<String, i64>) -> Option<i64> {
        match node.kind() {
            "number_literal" => parse_c_int(self.text(node)),
            "char_literal" => char_value(self.text(node)),
            "identifier" => known.get(self.text(node)).copied(),
            "parenthesized_expression" => self.eval_const(&node.named_child(0)?, known),
            "cast_expression" => self.eval_const(&node.child_by_field_name("value")?, known),
            "unary_expression" => {
                let value = self.eval_const(&node.child_by_field_name("argument")?, known)?;
                match node.child_by_field_name("operator")?.kind() {
                    "-" => value.checked_neg(),
                    "+" => Some(value),
                    "~" => Some(!value),
                    "!" => Some(i64::from(value == 0)),
                    _ => None,
                }
            }
            "binary_expression" => {
                let left = self.eval_const(&node.child_by_field_name("left")?, known)?;
                let right = self.eval_const(&node.child_by_field_name("right")?, known)?;
                binary_op(node.child_by_field_name("operator")?.kind(), left, right)
            }
            "conditional_expression" => {
                let condition = self.eval_const(&node.child_by_field_name("condition")?, known)?;
                let branch = if condition != 0 { "consequence" } else { "alternative" };
                self.eval_const(&node.child_by_field_name(branch)?, known)
            }
            _ => None,
        }
    }

    /// Qualifiers and type specifier in source order, without storage class.
    /// Inline aggregates are replaced by their label.
    fn specifier_text(&self, node: &TsNode, typedef_name: Option<&str>) -> String {
        let type_node = node.child_by_field_name("type");
        let mut parts: Vec<String> = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                parts.push(self.text(&child).to_string());
            } else if Some(child) == type_node {
                if is_aggregate_specifier(&child) && has_body(&child) {
                    parts.push(self.aggregate_label(&child, typedef_name));
                } else {
                    parts.push(normalize_ws(self.text(&child)));
                }
            }
        }
        parts.join(" ")
    }

    /// Type spelled by the specifiers plus the declarator with its name cut out.
    fn type_text(&self, specifiers: &str, declarator: Option<TsNode>, name: Option<TsNode>) -> String {
        let Some(declarator) = declarator else {
            return specifiers.to_string();
        };
        let text = self.text(&declarator);
        let suffix = match name {
            Some(n) if n.start_byte() >= declarator.start_byte() && n.end_byte() <= declarator.end_byte() => {
                let start = n.start_byte() - declarator.start_byte();
                let end = n.end_byte() - declarator.start_byte();
                format!("{}{}", &text[..start], &text[end..])
            }
            _ => text.to_string(),
        };
        normalize_ws(&format!("{} {}", specifiers, suffix))
    }

    fn syntax_errors(&self, root: &TsNode) -> Option<String> {
        if !root.has_error() {
            return None;
        }
        let mut messages = Vec::new();
        self.collect_errors(root, &mut messages);
        if messages.is_empty() {
            messages.push(format!("{}: syntax error", self.path));
        }
        Some(messages.join("\n"))
    }

    fn collect_errors(&self, node: &TsNode, messages: &mut Vec<String>) {
        if messages.len() >= MAX_SYNTAX_ERRORS {
            return;
        }
        if node.is_missing() {
            messages.push(format!(
                "{}:{}:{}: missing {}",
                self.path,
                get_start_line(node),
                get_start_column(node),
                node.kind()
            ));
            return;
        }
        if node.is_error() {
            let snippet: String = normalize_ws(self.text(node)).chars().take(40).collect();
            messages.push(format!(
                "{}:{}:{}: unexpected `{}`",
                self.path,
                line_at(self.source, node.start_byte()),
                get_start_column(node),
                snippet
            ));
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.has_error() {
                self.collect_errors(&child, messages);
            }
        }
    }
}

/// Running value of enum constants.
///
/// Values are numbers while every initializer evaluates. An initializer
/// that does not is kept as text, and the constants after it count up from
/// that text.
struct EnumCounter {
    next: Running,
    known: HashMap<String, i64>,
}

enum Running {
    Known(i64),
    Expr(String, i64),
}

impl EnumCounter {
    fn new() -> Self {
        Self {
            next: Running::Known(0),
            known: HashMap::new(),
        }
    }

    /// Value of constant `name`. `explicit` holds the initializer text and
    /// its evaluated value.
    fn assign(&mut self, name: &str, explicit: Option<(&str, Option<i64>)>) -> String {
        let current = match explicit {
            Some((_, Some(n))) => Running::Known(n),
            Some((text, None)) => Running::Expr(text.to_string(), 0),
            None => std::mem::replace(&mut self.next, Running::Known(0)),
        };
        let value = match &current {
            Running::Known(n) => {
                self.known.insert(name.to_string(), *n);
                n.to_string()
            }
            Running::Expr(base, 0) => base.clone(),
            Running::Expr(base, offset) => format!("({}) + {}", base, offset),
        };
        self.next = match current {
            Running::Known(n) => Running::Known(n.wrapping_add(1)),
            Running::Expr(base, offset) => Running::Expr(base, offset + 1),
        };
        value
    }
}

fn binary_op(op: &str, left: i64, right: i64) -> Option<i64> {
    let value = match op {
        "+" => left.checked_add(right)?,
        "-" => left.checked_sub(right)?,
        "*" => left.checked_mul(right)?,
        "/" => left.checked_div(right)?,
        "%" => left.checked_rem(right)?,
        "<<" => left.checked_shl(u32::try_from(right).ok()?)?,
        ">>" => left.checked_shr(u32::try_from(right).ok()?)?,
        "&" => left & right,
        "|" => left | right,
        "^" => left ^ right,
        "&&" => i64::from(left != 0 && right != 0),
        "||" => i64::from(left != 0 || right != 0),
        "==" => i64::from(left == right),
        "!=" => i64::from(left != right),
        "<" => i64::from(left < right),
        ">" => i64::from(left > right),
        "<=" => i64::from(left <= right),
        ">=" => i64::from(left >= right),
        _ => return None,
    };
    Some(value)
}

/// Value of a plain character literal such as `'A'`.
fn char_value(text: &str) -> Option<i64> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '\\' => Some(i64::from(u32::from(c))),
        _ => None,
    }
}

/// Integer literal value, accepting C prefixes, suffixes and parentheses.
fn parse_c_int(text: &str) -> Option<i64> {
    let mut text = text.trim();
    while let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner.trim();
    }
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, text),
    };
    let body = body.trim_end_matches(&['u', 'U', 'l', 'L'][..]);
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if body.len() > 1 && body.starts_with('0') {
        i64::from_str_radix(&body[1..], 8).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

fn is_aggregate_specifier(node: &TsNode) -> bool {
    matches!(
        node.kind(),
        "struct_specifier" | "union_specifier" | "enum_specifier"
    )
}

fn has_body(node: &TsNode) -> bool {
    node.child_by_field_name("body").is_some()
}

/// Declarator wrapped by `node`, by field or as first named child.
fn inner_declarator<'t>(node: &TsNode<'t>) -> Option<TsNode<'t>> {
    node.child_by_field_name("declarator")
        .or_else(|| node.named_child(0))
}

/// Identifier declared by a (possibly nested) declarator.
fn declarator_name<'t>(node: &TsNode<'t>) -> Option<TsNode<'t>> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "primitive_type" => Some(*node),
        "pointer_declarator" | "array_declarator" | "init_declarator" | "function_declarator"
        | "attributed_declarator" | "parenthesized_declarator" => {
            declarator_name(&inner_declarator(node)?)
        }
        _ => None,
    }
}

/// The function declarator when `node` declares a function rather than a
/// function pointer.
fn function_declarator<'t>(node: &TsNode<'t>) -> Option<TsNode<'t>> {
    match node.kind() {
        "function_declarator" => {
            let inner = node.child_by_field_name("declarator")?;
            (inner.kind() == "identifier").then_some(*node)
        }
        "pointer_declarator" | "attributed_declarator" => function_declarator(&inner_declarator(node)?),
        _ => None,
    }
}

/// Number of pointer declarators between `outer` and `target`.
fn pointer_depth(outer: &TsNode, target: &TsNode) -> usize {
    let mut depth = 0;
    let mut current = *outer;
    while current != *target {
        if current.kind() == "pointer_declarator" {
            depth += 1;
        }
        match inner_declarator(&current) {
            Some(next) => current = next,
            None => break,
        }
    }
    depth
}

/// Fill identity metadata: kit, unique id, class name and API source.
fn annotate(node: &mut Node, parent: Option<(&str, &str, NodeKind)>) {
    let file_name = node.location.file_name().to_string();
    if let Some(kit) = node
        .comment
        .as_deref()
        .and_then(|c| KIT_TAG.captures_iter(c).last())
        .and_then(|caps| caps.get(1))
    {
        node.kit_name = kit.as_str().to_string();
    } else if let Some((kit, _, _)) = parent {
        node.kit_name = kit.to_string();
    }
    node.is_system_api = node
        .comment
        .as_deref()
        .is_some_and(|c| c.contains("@systemapi"));

    let display = node.display_name().to_string();
    match (node.kind, parent) {
        (NodeKind::TranslationUnit, _) => {
            node.unique_id = node.name.clone();
            node.class_name = file_name.clone();
        }
        (_, Some((_, _, NodeKind::TranslationUnit))) | (_, None) => {
            node.unique_id = format!("{}#{}", node.location.path, display);
            node.class_name = file_name.clone();
        }
        (_, Some((_, parent_name, _))) => {
            node.unique_id = format!("{}#{}#{}", node.location.path, parent_name, display);
            node.class_name = format!("{}-{}", file_name, parent_name);
        }
    }

    if node.kind == NodeKind::Function {
        node.api_source = api_source(&node.name);
    }

    let kit = node.kit_name.clone();
    let kind = node.kind;
    for child in &mut node.children {
        annotate(child, Some((&kit, &display, kind)));
    }
}

/// Classify an API by its name prefix.
pub fn api_source(name: &str) -> ApiSource {
    if CLOSED_API.is_match(name) {
        ApiSource::Closed
    } else if OPEN_API.is_match(name) {
        ApiSource::Open
    } else {
        ApiSource::ThirdParty
    }
}
