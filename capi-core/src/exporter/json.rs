//! JSON format exporter.

use serde::Serialize;

use super::ExportConfig;
use crate::aggregate::ApiChange;
use crate::differ::{DiffRecord, DiffResult};
use crate::types::SyntaxError;

/// One record as written to `diff_result.json`.
#[derive(Debug, Serialize)]
pub struct RecordView<'a> {
    pub kind: &'a str,
    pub message: &'a str,
    pub old_value: &'a str,
    pub new_value: &'a str,
    pub old_full_text: &'a str,
    pub new_full_text: &'a str,
    pub file_path: &'a str,
    pub line: u32,
    pub is_compatible: bool,
    pub category: &'a str,
    pub api_name: &'a str,
    pub api_kind: Option<&'static str>,
    pub unique_id: &'a str,
    pub kit_name: &'a str,
    pub sub_system: &'a str,
    pub is_system_api: bool,
    pub api_source: &'static str,
}

impl<'a> From<&'a DiffRecord> for RecordView<'a> {
    fn from(record: &'a DiffRecord) -> Self {
        Self {
            kind: record.kind.as_str(),
            message: record.kind.description(),
            old_value: &record.old_value,
            new_value: &record.new_value,
            old_full_text: &record.old_full_text,
            new_full_text: &record.new_full_text,
            file_path: record.path(),
            line: record.line(),
            is_compatible: record.is_compatible,
            category: record.category.label(),
            api_name: &record.api_name,
            api_kind: record.api_kind.map(|k| k.as_str()),
            unique_id: &record.unique_id,
            kit_name: &record.kit_name,
            sub_system: &record.sub_system,
            is_system_api: record.is_system_api,
            api_source: record.api_source.as_str(),
        }
    }
}

fn to_string<T: Serialize + ?Sized>(value: &T, config: &ExportConfig) -> Result<String, serde_json::Error> {
    if config.pretty_print {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Export the flat record list.
pub fn export(records: &[DiffRecord], config: &ExportConfig) -> Result<String, serde_json::Error> {
    let views: Vec<RecordView<'_>> = records.iter().map(RecordView::from).collect();
    to_string(&views, config)
}

/// Export the complete result, files and summary included.
pub fn export_result(result: &DiffResult, config: &ExportConfig) -> Result<String, serde_json::Error> {
    to_string(result, config)
}

pub fn export_api_changes(changes: &[ApiChange], config: &ExportConfig) -> Result<String, serde_json::Error> {
    to_string(changes, config)
}

pub fn export_syntax_errors(errors: &[SyntaxError], config: &ExportConfig) -> Result<String, serde_json::Error> {
    to_string(errors, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::DiffKind;
    use crate::types::{Node, NodeKind};

    fn make_record() -> DiffRecord {
        let node = Node::new(NodeKind::Function, "OH_Foo").at("include/a.h", 4, 1);
        DiffRecord::create(DiffKind::FunctionReturnChange, "int", "long")
            .with_nodes(Some(&node), Some(&node))
    }

    #[test]
    fn test_export_json() {
        let output = export(&[make_record()], &ExportConfig::default()).unwrap();
        assert!(output.contains("\"kind\":\"FUNCTION_RETURN_CHANGE\""));
        assert!(output.contains("\"file_path\":\"include/a.h\""));
        assert!(output.contains("\"line\":4"));
        assert!(output.contains("\"is_compatible\":false"));
    }

    #[test]
    fn test_export_json_pretty() {
        let config = ExportConfig { pretty_print: true };
        let output = export(&[make_record()], &config).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_export_syntax_errors() {
        let errors = vec![SyntaxError {
            file: "include/b.h".to_string(),
            message: "include/b.h:3:1: unexpected `}`".to_string(),
        }];
        let output = export_syntax_errors(&errors, &ExportConfig::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["file"], "include/b.h");
    }
}
