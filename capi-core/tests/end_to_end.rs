//! End-to-end tests over real header trees on disk.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use capi_core::exporter::{json, markdown, ExportConfig};
use capi_core::{
    aggregate, check_compatibility, ChangeCategory, DiffEngine, DiffKind, DiffResult,
};

const NET_HEADER: &str = r#"/**
 * @addtogroup Net
 * @{
 *
 * @brief Socket helpers.
 * @since 10
 */

/**
 * @file net_socket.h
 * @kit NetKit
 * @since 10
 */

#ifndef NET_SOCKET_H
#define NET_SOCKET_H

#ifdef __cplusplus
extern "C" {
#endif

#define NET_MAX_SOCKETS 64

/**
 * @brief Socket state.
 * @since 10
 */
typedef enum {
    NET_CLOSED = 0,
    NET_OPEN,
} Net_State;

/**
 * @brief Socket options.
 * @since 10
 */
typedef struct {
    int timeout;
    unsigned int flags;
} Net_Options;

/**
 * @brief Opens a socket.
 * @param options Socket options.
 * @return Socket id.
 * @permission ohos.permission.INTERNET
 * @syscap SystemCapability.Communication.NetStack
 * @since 10
 */
int OH_Net_Open(const Net_Options *options);

#ifdef __cplusplus
}
#endif

#endif
/** @} */
"#;

fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
}

fn diff_trees(old: &[(&str, &str)], new: &[(&str, &str)]) -> DiffResult {
    let old_dir = TempDir::new().unwrap();
    let new_dir = TempDir::new().unwrap();
    write_tree(old_dir.path(), old);
    write_tree(new_dir.path(), new);
    DiffEngine::default()
        .diff_dirs(old_dir.path(), new_dir.path())
        .unwrap()
}

fn diff_header(old: &str, new: &str) -> DiffResult {
    diff_trees(&[("include/a.h", old)], &[("include/a.h", new)])
}

fn kinds(result: &DiffResult) -> Vec<DiffKind> {
    result.records.iter().map(|r| r.kind).collect()
}

#[test]
fn test_identical_tree_has_no_records() {
    let files = [("include/net/net_socket.h", NET_HEADER)];
    let result = diff_trees(&files, &files);
    assert!(result.records.is_empty());
    assert!(result.syntax_errors.is_empty());
}

#[test]
fn test_same_content_reparsed_has_no_records() {
    let result = DiffEngine::default()
        .diff_sources(NET_HEADER, &format!("{}\n", NET_HEADER), "include/net/net_socket.h")
        .unwrap();
    assert!(result.records.is_empty());
}

#[test]
fn test_add_remove_symmetry() {
    let base = "int OH_Foo(void);\n";
    let extended = "int OH_Foo(void);\nint OH_Bar(int x);\n";

    let added = diff_header(base, extended);
    assert_eq!(kinds(&added), vec![DiffKind::AddApi]);
    assert_eq!(added.records[0].old_value, "NA");
    assert_eq!(added.records[0].category, ChangeCategory::ApiAdded);

    let removed = diff_header(extended, base);
    assert_eq!(kinds(&removed), vec![DiffKind::ReduceApi]);
    assert_eq!(removed.records[0].new_value, "NA");
    assert_eq!(removed.records[0].category, ChangeCategory::ApiRemoved);
    assert_eq!(added.records[0].new_value, removed.records[0].old_value);
}

#[test]
fn test_swapped_parameters() {
    let result = diff_header(
        "int OH_Copy(int a, int b);\n",
        "int OH_Copy(int b, int a);\n",
    );
    assert_eq!(
        kinds(&result),
        vec![DiffKind::FunctionParamPosChange, DiffKind::FunctionParamPosChange]
    );
}

#[test]
fn test_struct_member_added() {
    let result = diff_header(
        "struct S {\n    int a;\n};\n",
        "struct S {\n    int a;\n    int b;\n};\n",
    );
    assert_eq!(kinds(&result), vec![DiffKind::StructMemberAdd]);
    assert_eq!(result.records[0].api_name, "b");
}

#[test]
fn test_enum_value_changed() {
    let result = diff_header("enum E {\n    X = 1,\n};\n", "enum E {\n    X = 2,\n};\n");
    assert_eq!(kinds(&result), vec![DiffKind::EnumMemberValueChange]);
    assert!(!result.records[0].is_compatible);
}

#[test]
fn test_respelled_enum_values_are_unchanged() {
    let result = diff_header(
        "enum OH_Flag { OH_A = 1 << 2, OH_B, OH_C = OH_A | 0x1 };\n",
        "enum OH_Flag { OH_A = 4, OH_B, OH_C = 5 };\n",
    );
    assert!(result.records.is_empty(), "{:?}", kinds(&result));
}

#[test]
fn test_typedef_underlying_type_change_is_reported() {
    let result = diff_header(
        "typedef int OH_Handle;\ntypedef struct { int a; } OH_Config;\n",
        "typedef long OH_Handle;\ntypedef struct { int a; } OH_Config;\n",
    );
    assert_eq!(kinds(&result), vec![DiffKind::TypedefNameTypeChange]);
    assert_eq!(result.records[0].old_value, "int");
    assert_eq!(result.records[0].new_value, "long");
    assert!(!result.records[0].is_compatible);
}

#[test]
fn test_file_block_count_increase() {
    let body = "/**\n * @brief Foo.\n * @since 10\n */\nint OH_Foo(void);\n";
    let old = format!("/**\n * @file a.h\n * @since 10\n */\n\n{}", body);
    let new = format!(
        "/**\n * @file a.h\n * @since 10\n */\n\n/**\n * @file a_ext.h\n * @since 11\n */\n\n{}",
        body
    );
    let result = diff_header(&old, &new);
    assert_eq!(kinds(&result), vec![DiffKind::DocTagFileIncrease]);
    assert_eq!(result.records[0].old_value, "NA");
}

#[test]
fn test_return_type_and_parameter_added() {
    let result = diff_header("int OH_Foo(int a);\n", "long OH_Foo(int a, int b);\n");
    assert_eq!(
        kinds(&result),
        vec![DiffKind::FunctionReturnChange, DiffKind::FunctionParamAdd]
    );
    let ret = &result.records[0];
    assert_eq!((ret.old_value.as_str(), ret.new_value.as_str()), ("int", "long"));
    let param = &result.records[1];
    assert_eq!((param.old_value.as_str(), param.new_value.as_str()), ("NA", "int b"));
    for record in &result.records {
        assert!(!record.is_compatible);
        assert_eq!(record.category, ChangeCategory::PrototypeChange);
    }
}

#[test]
fn test_realistic_header_evolution() {
    let new_header = NET_HEADER
        .replace("int OH_Net_Open(const Net_Options *options);", "long OH_Net_Open(const Net_Options *options);")
        .replace("    unsigned int flags;\n", "    unsigned int flags;\n    int retries;\n")
        .replace(
            "@permission ohos.permission.INTERNET",
            "@permission ohos.permission.INTERNET and ohos.permission.GET_NETWORK_INFO",
        );
    let result = diff_trees(
        &[("include/net/net_socket.h", NET_HEADER)],
        &[("include/net/net_socket.h", &new_header)],
    );

    let kinds = kinds(&result);
    assert!(kinds.contains(&DiffKind::FunctionReturnChange));
    assert!(kinds.contains(&DiffKind::StructMemberAdd));
    assert!(kinds.contains(&DiffKind::DocTagPermissionRangeSmaller));
    assert!(result.records.iter().all(|r| r.kit_name == "NetKit"));

    let rows = aggregate(&result.records);
    let open = rows.iter().find(|r| r.api_name == "OH_Net_Open").unwrap();
    assert!(open.tally.prototype_change);
    assert!(open.tally.constraint_change);
    assert!(open.tally.modified);

    let findings = check_compatibility(&result.records, None);
    let ids: Vec<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
    assert!(ids.contains(&"API_CHANGE_INCOMPATIBLE_06"));
    assert!(ids.contains(&"API_CHANGE_INCOMPATIBLE_47"));

    let only_return = vec!["API_CHANGE_INCOMPATIBLE_06".to_string()];
    assert_eq!(check_compatibility(&result.records, Some(&only_return)).len(), 1);

    let docs = markdown::export_by_kit(&result.records);
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].kit, "NetKit");

    let exported = json::export(&result.records, &ExportConfig::default()).unwrap();
    assert!(exported.contains("FUNCTION_RETURN_CHANGE"));
}

#[test]
fn test_syntax_errors_are_reported() {
    let result = diff_header("int OH_Foo(int a);\n", "int OH_Foo(int a;\nint OH_Bar(void);\n");
    assert!(!result.syntax_errors.is_empty());
    assert_eq!(result.syntax_errors[0].file, "include/a.h");
}
