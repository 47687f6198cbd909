//! Table output formatting using the `tabled` crate
//!
//! Rows are any serializable type; columns pick fields by key. Long cells are
//! truncated to the column limit and the whole table wraps at terminal width
//! when writing to a TTY.

use super::{terminal_width, truncate, Alignment, Column, OutputConfig};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Columns, style::Style, Alignment as TabledAlignment, Modify, Width},
};

/// Table output formatter
pub struct TableOutput;

impl TableOutput {
    /// Format data as a table with the given columns
    pub fn format_with_columns<T: Serialize>(
        data: &[T],
        columns: &[Column],
        config: &OutputConfig,
    ) -> String {
        if data.is_empty() {
            return "(no results)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(columns.iter().map(|c| c.name.as_str()));

        for item in data {
            let json = serde_json::to_value(item).unwrap_or_default();
            let row: Vec<String> = columns
                .iter()
                .map(|col| {
                    let value = json.get(&col.key).cloned().unwrap_or_default();
                    Self::format_value(&value, col, config)
                })
                .collect();
            builder.push_record(row);
        }

        let mut table = builder.build();
        table.with(Style::rounded());

        for (i, col) in columns.iter().enumerate() {
            let alignment = match col.align {
                Alignment::Left => TabledAlignment::left(),
                Alignment::Right => TabledAlignment::right(),
            };
            table.with(Modify::new(Columns::single(i)).with(alignment));
        }

        if config.should_truncate() {
            table.with(Width::wrap(terminal_width()));
        }

        table.to_string()
    }

    fn format_value(value: &serde_json::Value, col: &Column, config: &OutputConfig) -> String {
        let s = value_to_string(value);
        match col.max_width {
            Some(max_width) if config.should_truncate() => truncate(&s, max_width),
            _ => s,
        }
    }
}

/// Convert a JSON value to a display string
pub(crate) fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(arr) => format!("[{} items]", arr.len()),
        serde_json::Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

/// Row types that know their own column layout
pub trait AsTable: Serialize {
    fn columns() -> Vec<Column>;
}
