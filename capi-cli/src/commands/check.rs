//! Check command - compatibility rule violations between two header trees
//!
//! Diffs the trees, then reports each incompatible change that an enabled
//! `API_CHANGE_INCOMPATIBLE_NN` rule forbids.

use std::path::Path;

use anyhow::bail;
use colored::Colorize;
use serde::Serialize;

use capi_core::classify::rule_by_id;
use capi_core::{check_compatibility, DiffOptions, Finding};

use crate::output::{
    timestamp, Alignment, Column, CsvOutput, MarkdownOutput, Output, OutputConfig, Outputter,
    TableOutput,
};

fn finding_columns() -> Vec<Column> {
    vec![
        Column::new("Rule", "rule_id"),
        Column::new("File", "file_path").with_max_width(40),
        Column::new("Line", "line").with_alignment(Alignment::Right),
        Column::new("Message", "message").with_max_width(80),
    ]
}

/// Check output for all formats
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub old_root: String,
    pub new_root: String,
    pub generated_at: String,
    /// Enabled rule ids; absent when every rule is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
    pub findings: Vec<Finding>,
}

impl Outputter for CheckReport {
    fn to_table(&self, config: &OutputConfig) -> String {
        let mut output = format!(
            "{} {} -> {} ({})\n",
            "CHECK:".cyan().bold(),
            self.old_root.yellow(),
            self.new_root.green(),
            self.generated_at.dimmed()
        );

        if self.findings.is_empty() {
            output.push_str(&format!("{}", "No compatibility violations.".green()));
            return output;
        }

        output.push_str(&format!(
            "{} {}\n",
            self.findings.len().to_string().red().bold(),
            "compatibility violations".red()
        ));
        output.push_str(&TableOutput::format_with_columns(
            &self.findings,
            &finding_columns(),
            config,
        ));
        output
    }

    fn to_csv(&self, config: &OutputConfig) -> String {
        let mut columns = finding_columns();
        columns.push(Column::new("Snippet", "code_snippet"));
        CsvOutput::format_with_columns(&self.findings, &columns, config)
    }

    fn to_markdown(&self, config: &OutputConfig) -> String {
        format!(
            "# API check: {} -> {}\n\n_{} violations. Generated {}._\n\n{}",
            self.old_root,
            self.new_root,
            self.findings.len(),
            self.generated_at,
            MarkdownOutput::format_with_columns(&self.findings, &finding_columns(), config)
        )
    }
}

/// Reject rule ids that name no known rule.
pub fn validate_rules(rules: &[String]) -> anyhow::Result<()> {
    for id in rules {
        if rule_by_id(id).is_none() {
            bail!("Unknown rule id '{}'. Run `capi rules` to list rule ids", id);
        }
    }
    Ok(())
}

/// Run the check command
pub async fn run(
    old: &Path,
    new: &Path,
    options: DiffOptions,
    rules: Option<Vec<String>>,
    fail_on_findings: bool,
    config: &OutputConfig,
) -> anyhow::Result<()> {
    if let Some(ids) = &rules {
        validate_rules(ids)?;
    }

    let result = super::diff_trees(old, new, options).await?;
    let findings = check_compatibility(&result.records, rules.as_deref());
    tracing::info!(
        "{} findings from {} records",
        findings.len(),
        result.records.len()
    );

    let count = findings.len();
    let report = CheckReport {
        old_root: old.display().to_string(),
        new_root: new.display().to_string(),
        generated_at: timestamp(),
        rules,
        findings,
    };
    Output::new(report, config).render()?;

    if fail_on_findings && count > 0 {
        bail!("{} compatibility violations found", count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn make_report(findings: Vec<Finding>) -> CheckReport {
        CheckReport {
            old_root: "old".to_string(),
            new_root: "new".to_string(),
            generated_at: "2024-01-01 00:00:00".to_string(),
            rules: None,
            findings,
        }
    }

    fn make_finding() -> Finding {
        Finding {
            file_path: "include/net/net_socket.h".to_string(),
            line: 62,
            rule_id: "API_CHANGE_INCOMPATIBLE_06".to_string(),
            message: "API check error of [api compatibility errors]:Changing function return type [int] to function return type [long] is prohibited.Please resolve it.".to_string(),
            code_snippet: "Old since:int OH_Net_Open(void);\nNew since:long OH_Net_Open(void);".to_string(),
        }
    }

    #[test]
    fn test_validate_rules() {
        assert!(validate_rules(&["API_CHANGE_INCOMPATIBLE_01".to_string()]).is_ok());
        let err = validate_rules(&["API_CHANGE_INCOMPATIBLE_99".to_string()]).unwrap_err();
        assert!(err.to_string().contains("API_CHANGE_INCOMPATIBLE_99"));
    }

    #[test]
    fn test_table_without_findings() {
        let config = OutputConfig::new(OutputFormat::Table).without_truncation();
        let output = make_report(vec![]).to_table(&config);
        assert!(output.contains("No compatibility violations."));
    }

    #[test]
    fn test_table_lists_findings() {
        let config = OutputConfig::new(OutputFormat::Table).without_truncation();
        let output = make_report(vec![make_finding()]).to_table(&config);
        assert!(output.contains("API_CHANGE_INCOMPATIBLE_06"));
        assert!(output.contains("net_socket.h"));
    }

    #[test]
    fn test_csv_quotes_snippet() {
        let output = make_report(vec![make_finding()]).to_csv(&OutputConfig::new(OutputFormat::Csv));
        assert!(output.starts_with("Rule,File,Line,Message,Snippet\n"));
        assert!(output.contains("\"Old since:int OH_Net_Open(void);\nNew since:long OH_Net_Open(void);\""));
    }

    #[test]
    fn test_markdown_escapes_newlines() {
        let output =
            make_report(vec![make_finding()]).to_markdown(&OutputConfig::new(OutputFormat::Markdown));
        assert!(output.contains("_1 violations."));
        assert!(output.contains("|API_CHANGE_INCOMPATIBLE_06|include/net/net_socket.h|62|"));
    }
}
