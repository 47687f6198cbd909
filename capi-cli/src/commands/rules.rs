//! Rules command - list the compatibility violation rules

use colored::Colorize;
use serde::Serialize;

use capi_core::{classify, RULES};

use crate::output::{Column, CsvOutput, MarkdownOutput, Output, OutputConfig, Outputter, TableOutput};

#[derive(Debug, Serialize)]
pub struct RuleRow {
    pub id: &'static str,
    pub kind: &'static str,
    pub category: &'static str,
    pub template: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RuleList {
    pub rules: Vec<RuleRow>,
}

impl RuleList {
    pub fn all() -> Self {
        let rules = RULES
            .iter()
            .map(|rule| RuleRow {
                id: rule.id,
                kind: rule.kind.as_str(),
                category: classify(rule.kind).1.label(),
                template: rule.template,
            })
            .collect();
        Self { rules }
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("Rule", "id"),
            Column::new("Kind", "kind"),
            Column::new("Category", "category"),
            Column::new("Template", "template").with_max_width(70),
        ]
    }
}

impl Outputter for RuleList {
    fn to_table(&self, config: &OutputConfig) -> String {
        format!(
            "{} {} rules ({} is the old text, {} the new)\n{}",
            "RULES:".cyan().bold(),
            self.rules.len(),
            "$$".yellow(),
            "&&".green(),
            TableOutput::format_with_columns(&self.rules, &Self::columns(), config)
        )
    }

    fn to_json(&self, config: &OutputConfig) -> String {
        crate::output::JsonOutput::format(&self.rules, config)
    }

    fn to_csv(&self, config: &OutputConfig) -> String {
        CsvOutput::format_with_columns(&self.rules, &Self::columns(), config)
    }

    fn to_markdown(&self, config: &OutputConfig) -> String {
        MarkdownOutput::format_with_columns(&self.rules, &Self::columns(), config)
    }
}

/// Run the rules command
pub async fn run(config: &OutputConfig) -> anyhow::Result<()> {
    Output::new(RuleList::all(), config).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_rule_list_matches_table() {
        let list = RuleList::all();
        assert_eq!(list.rules.len(), RULES.len());
        assert_eq!(list.rules[0].id, "API_CHANGE_INCOMPATIBLE_01");
        assert_eq!(list.rules[0].kind, "REDUCE_API");
    }

    #[test]
    fn test_json_is_a_flat_array() {
        let output = RuleList::all().to_json(&OutputConfig::new(OutputFormat::Json));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().map(|a| a.len()), Some(RULES.len()));
    }

    #[test]
    fn test_csv_rows() {
        let output = RuleList::all().to_csv(&OutputConfig::new(OutputFormat::Csv));
        assert_eq!(output.lines().count(), RULES.len() + 1);
        assert!(output.contains("API_CHANGE_INCOMPATIBLE_47,DOC_TAG_PERMISSION_RANGE_SMALLER"));
    }
}
