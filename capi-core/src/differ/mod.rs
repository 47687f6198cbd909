//! Structural diff of parsed header trees.
//!
//! Declarations are matched across versions by name and kind
//! ([`matcher`]), matched pairs are compared by a per-kind differ
//! ([`declarations`]) after their documentation ([`doc`]), and one-sided
//! declarations become add/remove records.
//!
//! # Example
//!
//! ```no_run
//! use capi_core::differ::{diff_units, DnfPermissionPolicy, DocDiffer};
//! use capi_core::parser::{parse_header, DoxygenParser};
//!
//! let old = parse_header("int OH_Foo(int a);", "a.h").unwrap();
//! let new = parse_header("long OH_Foo(int a, int b);", "a.h").unwrap();
//! let docs = DocDiffer::new(&DoxygenParser, &DnfPermissionPolicy);
//!
//! let mut records = Vec::new();
//! diff_units(Some(&old), Some(&new), &docs, &mut records).unwrap();
//! for record in &records {
//!     println!("{}: {} -> {}", record.kind.as_str(), record.old_value, record.new_value);
//! }
//! ```

pub mod changes;
pub mod declarations;
pub mod doc;
pub mod matcher;
pub mod permission;

pub use changes::{
    ChangeCategory, DiffKind, DiffRecord, DiffResult, DiffSummary, FileChange, FileStatus,
};
pub use declarations::{added, diff_declaration, removed};
pub use doc::DocDiffer;
pub use matcher::{node_key, reconcile, KeyedNodes, Pairing};
pub use permission::{DnfPermissionPolicy, PermissionPolicy, RangeChange};

use crate::error::Result;
use crate::types::Node;

/// Compare a matched pair: documentation first, then the declaration.
pub fn diff_pair(old: &Node, new: &Node, docs: &DocDiffer<'_>, out: &mut Vec<DiffRecord>) -> Result<()> {
    let start = out.len();
    docs.diff(old, new, out)?;
    diff_declaration(old, new, out);
    // API status follows the old declaration.
    for record in &mut out[start..] {
        record.set_owner(new);
        record.is_api_change = old.is_extern;
    }
    Ok(())
}

/// Diff two versions of one header.
///
/// A missing side reports every top-level declaration of the other side as
/// added or removed.
pub fn diff_units(
    old: Option<&Node>,
    new: Option<&Node>,
    docs: &DocDiffer<'_>,
    out: &mut Vec<DiffRecord>,
) -> Result<()> {
    let empty = KeyedNodes::new();
    let old_scope = old.map(KeyedNodes::file_scope);
    let new_scope = new.map(KeyedNodes::file_scope);

    let pairings = reconcile(
        old_scope.as_ref().unwrap_or(&empty),
        new_scope.as_ref().unwrap_or(&empty),
    );
    for pairing in pairings {
        match pairing {
            Pairing::Matched(o, n) => diff_pair(o, n, docs, out)?,
            Pairing::Removed(o) => out.extend(removed(o).map(|r| r.with_owner(o))),
            Pairing::Added(n) => out.extend(added(n).map(|r| r.with_owner(n))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_header, DoxygenParser};

    fn make_docs() -> DocDiffer<'static> {
        DocDiffer::new(&DoxygenParser, &DnfPermissionPolicy)
    }

    fn diff_sources(old: &str, new: &str) -> Vec<DiffRecord> {
        let old = parse_header(old, "include/a.h").unwrap();
        let new = parse_header(new, "include/a.h").unwrap();
        let mut out = Vec::new();
        diff_units(Some(&old), Some(&new), &make_docs(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_identical_headers() {
        let source = "/** @since 10 */\nint OH_Foo(int a);\nstruct S { int a; };\n";
        assert!(diff_sources(source, source).is_empty());
    }

    #[test]
    fn test_function_signature_change() {
        let records = diff_sources("int OH_Foo(int a);\n", "long OH_Foo(int a, int b);\n");
        let kinds: Vec<DiffKind> = records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![DiffKind::FunctionReturnChange, DiffKind::FunctionParamAdd]
        );
        assert_eq!(records[1].new_value, "int b");
        assert_eq!(records[0].owner_name, "OH_Foo");
    }

    #[test]
    fn test_added_function() {
        let records = diff_sources("int OH_Foo(void);\n", "int OH_Foo(void);\nint OH_Bar(void);\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::AddApi);
        assert_eq!(records[0].category, ChangeCategory::ApiAdded);
        assert_eq!(records[0].api_name, "OH_Bar");
    }

    #[test]
    fn test_removed_file_reports_every_declaration() {
        let old = parse_header("int OH_Foo(void);\n#define LIMIT 4\n", "include/a.h").unwrap();
        let mut out = Vec::new();
        diff_units(Some(&old), None, &make_docs(), &mut out).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.kind == DiffKind::ReduceApi && r.new_value == "NA"));
    }

    #[test]
    fn test_api_change_follows_storage_class() {
        let records = diff_sources(
            "int OH_Foo(int a);\nstruct OH_S { int a; };\nstatic int OH_Local(void);\n",
            "long OH_Foo(int a);\nstruct OH_S { int a; int b; };\nvoid OH_Bar(void);\n",
        );
        let flags: Vec<(DiffKind, &str, bool)> = records
            .iter()
            .map(|r| (r.kind, r.owner_name.as_str(), r.is_api_change))
            .collect();
        assert_eq!(
            flags,
            vec![
                (DiffKind::FunctionReturnChange, "OH_Foo", true),
                (DiffKind::StructMemberAdd, "OH_S", true),
                (DiffKind::ReduceApi, "OH_Local", false),
                (DiffKind::AddApi, "OH_Bar", true),
            ]
        );
    }

    #[test]
    fn test_api_change_taken_from_old_declaration() {
        let records = diff_sources("static int OH_Foo(int a);\n", "int OH_Foo(long a);\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DiffKind::FunctionParamTypeChange);
        assert!(!records[0].is_api_change);

        let records = diff_sources("int OH_Foo(int a);\n", "static int OH_Foo(long a);\n");
        assert!(records[0].is_api_change);
    }

    #[test]
    fn test_doc_records_come_first() {
        let records = diff_sources(
            "/** @since 10 */\nint OH_Foo(int a);\n",
            "/** @since 11 */\nlong OH_Foo(int a);\n",
        );
        let kinds: Vec<DiffKind> = records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![DiffKind::DocTagSinceAToB, DiffKind::FunctionReturnChange]
        );
    }
}
