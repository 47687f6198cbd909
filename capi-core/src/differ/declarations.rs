//! Per-kind declaration differs.
//!
//! Each differ compares a matched old/new pair and appends records to the
//! caller's buffer. [`diff_declaration`] dispatches on the node kind.

use super::changes::{DiffKind, DiffRecord};
use super::matcher::{reconcile, KeyedNodes, Pairing};
use crate::types::{Node, NodeKind, NA};

/// Record kinds used by the struct and union differs.
struct AggregateKinds {
    name: DiffKind,
    member_add: DiffKind,
    member_reduce: DiffKind,
    member_type: DiffKind,
    member_name: DiffKind,
}

const STRUCT_KINDS: AggregateKinds = AggregateKinds {
    name: DiffKind::StructNameChange,
    member_add: DiffKind::StructMemberAdd,
    member_reduce: DiffKind::StructMemberReduce,
    member_type: DiffKind::StructMemberTypeChange,
    member_name: DiffKind::StructMemberNameChange,
};

const UNION_KINDS: AggregateKinds = AggregateKinds {
    name: DiffKind::UnionNameChange,
    member_add: DiffKind::UnionMemberAdd,
    member_reduce: DiffKind::UnionMemberReduce,
    member_type: DiffKind::UnionMemberTypeChange,
    member_name: DiffKind::UnionMemberNameChange,
};

fn record(kind: DiffKind, old_value: &str, new_value: &str, old: &Node, new: &Node) -> DiffRecord {
    DiffRecord::create(kind, old_value, new_value).with_nodes(Some(old), Some(new))
}

/// Compare a matched pair of declarations of the same kind.
pub fn diff_declaration(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    if old.kind != new.kind {
        return;
    }
    match old.kind {
        NodeKind::Function => diff_function(old, new, out),
        NodeKind::Macro => diff_macro(old, new, out),
        NodeKind::Struct => diff_aggregate(old, new, &STRUCT_KINDS, out),
        NodeKind::Union => diff_aggregate(old, new, &UNION_KINDS, out),
        NodeKind::Enum => diff_enum(old, new, out),
        NodeKind::Variable => diff_variable(old, new, out),
        NodeKind::Typedef => diff_typedef(old, new, out),
        NodeKind::EnumConstant => diff_anonymous_constant(old, new, out),
        NodeKind::TranslationUnit | NodeKind::Field | NodeKind::Param => {}
    }
}

/// Record for a declaration present only in the new tree.
pub fn added(node: &Node) -> Option<DiffRecord> {
    let record = match node.kind {
        NodeKind::TranslationUnit => return None,
        NodeKind::EnumConstant => DiffRecord::create(DiffKind::EnumMemberAdd, NA, &node.content),
        _ => DiffRecord::create(DiffKind::AddApi, NA, node.declaration()),
    };
    Some(record.with_nodes(None, Some(node)))
}

/// Record for a declaration present only in the old tree.
pub fn removed(node: &Node) -> Option<DiffRecord> {
    let record = match node.kind {
        NodeKind::TranslationUnit => return None,
        NodeKind::EnumConstant => DiffRecord::create(DiffKind::EnumMemberReduce, &node.content, NA),
        _ => DiffRecord::create(DiffKind::ReduceApi, node.declaration(), NA),
    };
    Some(record.with_nodes(Some(node), None))
}

fn diff_function(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    let old_return = old.return_type.as_deref().unwrap_or(NA);
    let new_return = new.return_type.as_deref().unwrap_or(NA);
    if old_return != new_return {
        out.push(record(DiffKind::FunctionReturnChange, old_return, new_return, old, new));
    }
    diff_params(old, new, out);
}

fn param_text(param: &Node) -> String {
    format!("{} {}", param.type_signature, param.name)
}

fn diff_params(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    let (old_params, new_params) = (&old.children, &new.children);
    if old_params.len() == new_params.len() {
        let old_text: Vec<String> = old_params.iter().map(param_text).collect();
        let new_text: Vec<String> = new_params.iter().map(param_text).collect();
        if old_text == new_text {
            return;
        }
        let moved = moved_params(old, new, &old_text, &new_text);
        if !moved.is_empty() {
            out.extend(moved);
            return;
        }
    }

    let count = old_params.len().max(new_params.len());
    for index in 0..count {
        match (old_params.get(index), new_params.get(index)) {
            (Some(o), None) => {
                out.push(record(DiffKind::FunctionParamReduce, &o.content, NA, old, new));
            }
            (None, Some(n)) => {
                out.push(record(DiffKind::FunctionParamAdd, NA, &n.content, old, new));
            }
            (Some(o), Some(n)) => {
                if o.type_signature != n.type_signature {
                    out.push(record(
                        DiffKind::FunctionParamTypeChange,
                        &o.type_signature,
                        &n.type_signature,
                        old,
                        new,
                    ));
                }
                if o.name != n.name {
                    out.push(record(DiffKind::FunctionParamNameChange, &o.name, &n.name, old, new));
                }
            }
            (None, None) => {}
        }
    }
}

/// Position changes when the new list is a reordering of the old one.
/// Empty when any old parameter is missing from the new list.
fn moved_params(old: &Node, new: &Node, old_text: &[String], new_text: &[String]) -> Vec<DiffRecord> {
    let mut moved = Vec::new();
    for (index, text) in old_text.iter().enumerate() {
        match new_text.iter().position(|t| t == text) {
            None => return Vec::new(),
            Some(position) if position != index => {
                moved.push(record(
                    DiffKind::FunctionParamPosChange,
                    &old.children[index].content,
                    &new.children[index].content,
                    old,
                    new,
                ));
            }
            Some(_) => {}
        }
    }
    moved
}

fn diff_macro(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    if old.name != new.name {
        out.push(record(DiffKind::DefineNameChange, &old.name, &new.name, old, new));
    }
    if old.value != new.value {
        out.push(record(
            DiffKind::DefineTextChange,
            old.value.as_deref().unwrap_or(NA),
            new.value.as_deref().unwrap_or(NA),
            old,
            new,
        ));
    }
}

fn joined_members(members: &[Node], separator: &str) -> String {
    members
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

fn diff_aggregate(old: &Node, new: &Node, kinds: &AggregateKinds, out: &mut Vec<DiffRecord>) {
    if old.name != new.name {
        out.push(record(kinds.name, &old.name, &new.name, old, new));
    }

    match (old.children.is_empty(), new.children.is_empty()) {
        (true, true) => return,
        (false, true) => {
            let members = joined_members(&old.children, ";");
            out.push(record(kinds.member_reduce, &members, NA, old, new));
            return;
        }
        (true, false) => {
            let members = joined_members(&new.children, ";");
            out.push(record(kinds.member_add, NA, &members, old, new));
            return;
        }
        (false, false) => {}
    }

    let old_members = KeyedNodes::members(&old.children);
    let new_members = KeyedNodes::members(&new.children);
    for pairing in reconcile(&old_members, &new_members) {
        match pairing {
            Pairing::Removed(member) => out.push(
                DiffRecord::create(kinds.member_reduce, &member.content, NA)
                    .with_nodes(Some(member), None),
            ),
            Pairing::Added(member) => out.push(
                DiffRecord::create(kinds.member_add, NA, &member.content)
                    .with_nodes(None, Some(member)),
            ),
            Pairing::Matched(o, n) => diff_member(o, n, kinds, out),
        }
    }
}

fn diff_member(old: &Node, new: &Node, kinds: &AggregateKinds, out: &mut Vec<DiffRecord>) {
    match (old.kind, new.kind) {
        (NodeKind::Struct, NodeKind::Struct) => diff_aggregate(old, new, &STRUCT_KINDS, out),
        (NodeKind::Union, NodeKind::Union) => diff_aggregate(old, new, &UNION_KINDS, out),
        (NodeKind::Enum, NodeKind::Enum) => diff_enum(old, new, out),
        _ => {}
    }

    // Types declared in this file are compared by the nested differ above.
    let declared_here = |node: &Node| {
        !node.location.path.is_empty() && node.type_signature.contains(&node.location.path)
    };
    let local_type = declared_here(old) || declared_here(new);
    if !local_type && old.type_signature != new.type_signature {
        out.push(record(
            kinds.member_type,
            &old.type_signature,
            &new.type_signature,
            old,
            new,
        ));
    }
    if old.name != new.name {
        out.push(record(kinds.member_name, &old.name, &new.name, old, new));
    }
}

fn diff_enum(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    if old.name != new.name {
        out.push(record(DiffKind::EnumNameChange, &old.name, &new.name, old, new));
    }

    match (old.children.is_empty(), new.children.is_empty()) {
        (true, true) => return,
        (false, true) => {
            let members = joined_members(&old.children, ",");
            out.push(record(DiffKind::EnumMemberReduce, &members, NA, old, new));
            return;
        }
        (true, false) => {
            let members = joined_members(&new.children, ",");
            out.push(record(DiffKind::EnumMemberAdd, NA, &members, old, new));
            return;
        }
        (false, false) => {}
    }

    let old_members = KeyedNodes::members(&old.children);
    let new_members = KeyedNodes::members(&new.children);
    for pairing in reconcile(&old_members, &new_members) {
        match pairing {
            Pairing::Removed(member) => out.push(
                DiffRecord::create(DiffKind::EnumMemberReduce, &member.content, NA)
                    .with_nodes(Some(member), None),
            ),
            Pairing::Added(member) => out.push(
                DiffRecord::create(DiffKind::EnumMemberAdd, NA, &member.content)
                    .with_nodes(None, Some(member)),
            ),
            Pairing::Matched(o, n) => {
                diff_constant_value(o, n, out);
                diff_constant_name(o, n, out);
            }
        }
    }
}

fn diff_constant_value(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    if old.value != new.value {
        out.push(record(
            DiffKind::EnumMemberValueChange,
            old.value.as_deref().unwrap_or(NA),
            new.value.as_deref().unwrap_or(NA),
            old,
            new,
        ));
    }
}

fn diff_constant_name(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    if old.name != new.name {
        out.push(record(DiffKind::EnumMemberNameChange, &old.name, &new.name, old, new));
    }
}

/// Constants of an anonymous enum matched directly at file scope.
fn diff_anonymous_constant(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    diff_constant_name(old, new, out);
    diff_constant_value(old, new, out);
}

fn diff_variable(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    let types_differ = old.type_signature != new.type_signature;
    let transition = match (old.is_const, new.is_const) {
        (true, true) if types_differ => Some(DiffKind::ConstantTypeChange),
        (true, false) => Some(DiffKind::ConstantChangeToVariable),
        (false, true) => Some(DiffKind::VariableChangeToConstant),
        (false, false) if types_differ => Some(DiffKind::VariableTypeChange),
        _ => None,
    };
    if let Some(kind) = transition {
        out.push(record(kind, &old.type_signature, &new.type_signature, old, new));
    }

    let (name_kind, value_kind) = if old.is_const {
        (DiffKind::ConstantNameChange, DiffKind::ConstantValueChange)
    } else {
        (DiffKind::VariableNameChange, DiffKind::VariableValueChange)
    };
    if old.name != new.name {
        out.push(record(name_kind, &old.name, &new.name, old, new));
    }
    if old.value != new.value {
        out.push(record(
            value_kind,
            old.value.as_deref().unwrap_or(NA),
            new.value.as_deref().unwrap_or(NA),
            old,
            new,
        ));
    }
}

fn diff_typedef(old: &Node, new: &Node, out: &mut Vec<DiffRecord>) {
    if old.name != new.name {
        out.push(record(DiffKind::TypedefNameTypeChange, &old.name, &new.name, old, new));
    } else if old.type_signature != new.type_signature {
        out.push(record(
            DiffKind::TypedefNameTypeChange,
            &old.type_signature,
            &new.type_signature,
            old,
            new,
        ));
    }

    for (o, n) in old.children.iter().zip(&new.children) {
        if !(o.name.is_empty() && n.name.is_empty()) {
            continue;
        }
        match (o.kind, n.kind) {
            (NodeKind::Struct, NodeKind::Struct) => diff_aggregate(o, n, &STRUCT_KINDS, out),
            (NodeKind::Union, NodeKind::Union) => diff_aggregate(o, n, &UNION_KINDS, out),
            (NodeKind::Enum, NodeKind::Enum) => diff_enum(o, n, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::changes::ChangeCategory;

    fn make_param(type_name: &str, name: &str) -> Node {
        Node::new(NodeKind::Param, name)
            .with_type(type_name)
            .with_content(format!("{} {}", type_name, name))
    }

    fn make_function(return_type: &str, params: Vec<Node>) -> Node {
        Node::new(NodeKind::Function, "OH_Foo")
            .with_return_type(return_type)
            .with_children(params)
            .at("a.h", 3, 1)
    }

    fn make_field(type_name: &str, name: &str) -> Node {
        Node::new(NodeKind::Field, name)
            .with_type(type_name)
            .with_content(format!("{} {}", type_name, name))
            .at("a.h", 2, 5)
    }

    fn make_constant(name: &str, value: &str) -> Node {
        Node::new(NodeKind::EnumConstant, name)
            .with_value(value)
            .with_content(format!("{} = {}", name, value))
    }

    fn diff(old: &Node, new: &Node) -> Vec<DiffRecord> {
        let mut out = Vec::new();
        diff_declaration(old, new, &mut out);
        out
    }

    fn kinds(records: &[DiffRecord]) -> Vec<DiffKind> {
        records.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_identical_function_has_no_changes() {
        let f = make_function("int", vec![make_param("int", "a")]);
        assert!(diff(&f, &f.clone()).is_empty());
    }

    #[test]
    fn test_return_and_param_add() {
        let old = make_function("int", vec![make_param("int", "a")]);
        let new = make_function("long", vec![make_param("int", "a"), make_param("int", "b")]);
        let records = diff(&old, &new);
        assert_eq!(
            kinds(&records),
            vec![DiffKind::FunctionReturnChange, DiffKind::FunctionParamAdd]
        );
        assert_eq!(records[0].old_value, "int");
        assert_eq!(records[0].new_value, "long");
        assert_eq!(records[1].old_value, "NA");
        assert_eq!(records[1].new_value, "int b");
        for r in &records {
            assert!(!r.is_compatible);
            assert_eq!(r.category, ChangeCategory::PrototypeChange);
        }
    }

    #[test]
    fn test_swapped_params_are_position_changes() {
        let old = make_function("int", vec![make_param("int", "a"), make_param("int", "b")]);
        let new = make_function("int", vec![make_param("int", "b"), make_param("int", "a")]);
        let records = diff(&old, &new);
        assert_eq!(
            kinds(&records),
            vec![DiffKind::FunctionParamPosChange, DiffKind::FunctionParamPosChange]
        );
        assert_eq!(records[0].old_value, "int a");
        assert_eq!(records[0].new_value, "int b");
    }

    #[test]
    fn test_param_type_and_name_change() {
        let old = make_function("int", vec![make_param("int", "a"), make_param("int", "b")]);
        let new = make_function("int", vec![make_param("int", "a"), make_param("long", "c")]);
        let records = diff(&old, &new);
        assert_eq!(
            kinds(&records),
            vec![DiffKind::FunctionParamTypeChange, DiffKind::FunctionParamNameChange]
        );
        assert!(!records[0].is_compatible);
        assert!(records[1].is_compatible);
    }

    #[test]
    fn test_param_reduce() {
        let old = make_function("int", vec![make_param("int", "a"), make_param("char *", "s")]);
        let new = make_function("int", vec![make_param("int", "a")]);
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::FunctionParamReduce]);
        assert_eq!(records[0].old_value, "char * s");
        assert_eq!(records[0].new_value, "NA");
    }

    #[test]
    fn test_macro_text_change() {
        let old = Node::new(NodeKind::Macro, "MAX").with_value("16");
        let new = Node::new(NodeKind::Macro, "MAX").with_value("32");
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::DefineTextChange]);

        let bare = Node::new(NodeKind::Macro, "MAX");
        let records = diff(&bare, &old);
        assert_eq!(records[0].old_value, "NA");
    }

    #[test]
    fn test_struct_member_add() {
        let old = Node::new(NodeKind::Struct, "S").with_children(vec![make_field("int", "a")]);
        let new = Node::new(NodeKind::Struct, "S")
            .with_children(vec![make_field("int", "a"), make_field("int", "b")]);
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::StructMemberAdd]);
        assert_eq!(records[0].new_value, "int b");
        assert_eq!(records[0].api_name, "b");
    }

    #[test]
    fn test_union_member_type_change() {
        let old = Node::new(NodeKind::Union, "U").with_children(vec![make_field("int", "a")]);
        let new = Node::new(NodeKind::Union, "U").with_children(vec![make_field("long", "a")]);
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::UnionMemberTypeChange]);
    }

    #[test]
    fn test_struct_loses_all_members() {
        let old = Node::new(NodeKind::Struct, "S")
            .with_children(vec![make_field("int", "a"), make_field("int", "b")]);
        let new = Node::new(NodeKind::Struct, "S");
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::StructMemberReduce]);
        assert_eq!(records[0].old_value, "int a;int b");
    }

    #[test]
    fn test_nested_anonymous_struct_recurses() {
        let label = "struct (anonymous at a.h:2:5)";
        let inner_old = Node::new(NodeKind::Struct, "")
            .with_type(label)
            .with_children(vec![make_field("int", "x")])
            .at("a.h", 2, 5);
        let inner_new = Node::new(NodeKind::Struct, "")
            .with_type(label)
            .with_children(vec![make_field("int", "x"), make_field("int", "y")])
            .at("a.h", 2, 5);
        let holder_old = make_field(label, "inner");
        let holder_new = make_field(label, "inner");

        let old = Node::new(NodeKind::Struct, "S").with_children(vec![inner_old, holder_old]);
        let new = Node::new(NodeKind::Struct, "S").with_children(vec![inner_new, holder_new]);
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::StructMemberAdd]);
        assert_eq!(records[0].new_value, "int y");
    }

    #[test]
    fn test_enum_value_change() {
        let old = Node::new(NodeKind::Enum, "E").with_children(vec![make_constant("X", "1")]);
        let new = Node::new(NodeKind::Enum, "E").with_children(vec![make_constant("X", "2")]);
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::EnumMemberValueChange]);
        assert!(!records[0].is_compatible);
        assert_eq!(records[0].old_value, "1");
        assert_eq!(records[0].new_value, "2");
    }

    #[test]
    fn test_enum_member_add_and_reduce() {
        let old = Node::new(NodeKind::Enum, "E")
            .with_children(vec![make_constant("X", "1"), make_constant("Y", "2")]);
        let new = Node::new(NodeKind::Enum, "E")
            .with_children(vec![make_constant("X", "1"), make_constant("Z", "3")]);
        let records = diff(&old, &new);
        assert_eq!(
            kinds(&records),
            vec![DiffKind::EnumMemberReduce, DiffKind::EnumMemberAdd]
        );
        assert!(records[1].is_compatible);
    }

    #[test]
    fn test_variable_to_constant() {
        let mut old = Node::new(NodeKind::Variable, "g_limit").with_type("int").with_value("3");
        old.is_const = false;
        let mut new = Node::new(NodeKind::Variable, "g_limit").with_type("const int").with_value("4");
        new.is_const = true;
        let records = diff(&old, &new);
        assert_eq!(
            kinds(&records),
            vec![DiffKind::VariableChangeToConstant, DiffKind::VariableValueChange]
        );
    }

    #[test]
    fn test_constant_type_change() {
        let mut old = Node::new(NodeKind::Variable, "LIMIT").with_type("const int");
        old.is_const = true;
        let mut new = Node::new(NodeKind::Variable, "LIMIT").with_type("const long");
        new.is_const = true;
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::ConstantTypeChange]);
    }

    #[test]
    fn test_typedef_recurses_into_anonymous_struct() {
        let old = Node::new(NodeKind::Typedef, "Config").with_type("Config").with_children(vec![
            Node::new(NodeKind::Struct, "").with_type("Config").with_children(vec![make_field("int", "a")]),
        ]);
        let new = Node::new(NodeKind::Typedef, "Config").with_type("Config").with_children(vec![
            Node::new(NodeKind::Struct, "").with_type("Config").with_children(vec![make_field("long", "a")]),
        ]);
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::StructMemberTypeChange]);
    }

    #[test]
    fn test_typedef_underlying_type_change() {
        let old = Node::new(NodeKind::Typedef, "Handle").with_type("int");
        let new = Node::new(NodeKind::Typedef, "Handle").with_type("long");
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::TypedefNameTypeChange]);
        assert_eq!(records[0].old_value, "int");
    }

    #[test]
    fn test_anonymous_constant_name_then_value() {
        let old = make_constant("A", "1");
        let new = make_constant("A", "2");
        let records = diff(&old, &new);
        assert_eq!(kinds(&records), vec![DiffKind::EnumMemberValueChange]);
    }

    #[test]
    fn test_added_and_removed() {
        let func = Node::new(NodeKind::Function, "OH_Foo").with_content("int OH_Foo(void)");
        let add = added(&func).unwrap();
        assert_eq!(add.kind, DiffKind::AddApi);
        assert_eq!(add.old_value, "NA");
        assert_eq!(add.new_value, "int OH_Foo(void)");

        let gone = removed(&func).unwrap();
        assert_eq!(gone.kind, DiffKind::ReduceApi);
        assert_eq!(gone.new_value, "NA");

        let st = Node::new(NodeKind::Struct, "S").with_type("struct S");
        assert_eq!(added(&st).unwrap().new_value, "struct S");

        let constant = make_constant("X", "1");
        assert_eq!(removed(&constant).unwrap().kind, DiffKind::EnumMemberReduce);

        let unit = Node::new(NodeKind::TranslationUnit, "a.h");
        assert!(added(&unit).is_none());
    }
}
