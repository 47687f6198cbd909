//! Markdown table output.

use super::table::value_to_string;
use super::{Column, OutputConfig};
use serde::Serialize;

/// Markdown output formatter
pub struct MarkdownOutput;

impl MarkdownOutput {
    /// Format rows as a GitHub-flavored markdown table
    pub fn format_with_columns<T: Serialize>(
        data: &[T],
        columns: &[Column],
        _config: &OutputConfig,
    ) -> String {
        let headers: Vec<String> = columns.iter().map(|c| Self::cell(&c.name)).collect();
        let mut output = format!("|{}|\n|{}|\n", headers.join("|"), vec!["---"; columns.len()].join("|"));

        for item in data {
            let json = serde_json::to_value(item).unwrap_or_default();
            let row: Vec<String> = columns
                .iter()
                .map(|col| {
                    let value = json.get(&col.key).cloned().unwrap_or_default();
                    Self::cell(&value_to_string(&value))
                })
                .collect();
            output.push_str(&format!("|{}|\n", row.join("|")));
        }

        output
    }

    fn cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', "<br />")
    }
}
