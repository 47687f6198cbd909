//! Diff command - structural diff between two header trees
//!
//! Compares an old and a new SDK header tree and reports every change with
//! its compatibility verdict. With an output directory the full reports are
//! written as JSON and per-kit markdown files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use capi_core::differ::{DiffRecord, DiffSummary};
use capi_core::exporter::{json, markdown, ExportConfig};
use capi_core::{aggregate, DiffOptions, DiffResult, SyntaxError};

use crate::output::{
    timestamp, Alignment, AsTable, Column, CsvOutput, Output, OutputConfig, Outputter,
    TableOutput,
};

/// Report file names written under `--output-dir`.
pub const RESULT_FILE: &str = "diff_result.json";
pub const API_CHANGES_FILE: &str = "api_changes.json";
pub const SYNTAX_ERRORS_FILE: &str = "syntax_errors.json";
pub const KIT_DIR: &str = "diff_by_kit";

/// One record flattened for tabular output
#[derive(Debug, Serialize)]
pub struct RecordRow {
    pub kind: &'static str,
    pub category: &'static str,
    pub compatible: bool,
    pub api: String,
    pub file: String,
    pub line: u32,
    pub old: String,
    pub new: String,
}

impl From<&DiffRecord> for RecordRow {
    fn from(record: &DiffRecord) -> Self {
        Self {
            kind: record.kind.as_str(),
            category: record.category.label(),
            compatible: record.is_compatible,
            api: if record.owner_name.is_empty() {
                record.api_name.clone()
            } else {
                record.owner_name.clone()
            },
            file: record.path().to_string(),
            line: record.line(),
            old: record.old_value.clone(),
            new: record.new_value.clone(),
        }
    }
}

impl AsTable for RecordRow {
    fn columns() -> Vec<Column> {
        vec![
            Column::new("Kind", "kind"),
            Column::new("API", "api").with_max_width(32),
            Column::new("File", "file").with_max_width(40),
            Column::new("Line", "line").with_alignment(Alignment::Right),
            Column::new("Old", "old").with_max_width(40),
            Column::new("New", "new").with_max_width(40),
        ]
    }
}

/// Diff output for all formats
#[derive(Debug, Serialize)]
pub struct DiffReport {
    pub old_root: String,
    pub new_root: String,
    pub generated_at: String,
    pub summary: DiffSummary,
    pub summary_text: String,
    pub duration_ms: f64,
    pub records: Vec<DiffRecord>,
    pub syntax_errors: Vec<SyntaxError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<String>,
}

impl DiffReport {
    pub fn new(old: &Path, new: &Path, result: DiffResult, incompatible_only: bool) -> Self {
        let records = if incompatible_only {
            result.records.into_iter().filter(|r| !r.is_compatible).collect()
        } else {
            result.records
        };
        Self {
            old_root: old.display().to_string(),
            new_root: new.display().to_string(),
            generated_at: timestamp(),
            summary: result.summary,
            summary_text: result.summary_text,
            duration_ms: result.duration_ms,
            records,
            syntax_errors: result.syntax_errors,
            report_dir: None,
        }
    }

    fn rows(&self, compatible: Option<bool>) -> Vec<RecordRow> {
        self.records
            .iter()
            .filter(|r| compatible.map_or(true, |c| r.is_compatible == c))
            .map(RecordRow::from)
            .collect()
    }
}

impl Outputter for DiffReport {
    fn to_table(&self, config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} -> {}\n",
            "DIFF:".cyan().bold(),
            self.old_root.yellow(),
            self.new_root.green()
        ));
        output.push_str(&format!(
            "{} ({:.0}ms, {})\n\n",
            self.summary_text,
            self.duration_ms,
            self.generated_at.dimmed()
        ));

        if self.records.is_empty() {
            output.push_str(&format!("{}\n", "No API changes detected.".dimmed()));
        }

        let incompatible = self.rows(Some(false));
        if !incompatible.is_empty() {
            output.push_str(&format!(
                "{} ({}):\n",
                "INCOMPATIBLE".red().bold(),
                incompatible.len()
            ));
            output.push_str(&TableOutput::format_with_columns(
                &incompatible,
                &RecordRow::columns(),
                config,
            ));
            output.push_str("\n\n");
        }

        let compatible = self.rows(Some(true));
        if !compatible.is_empty() {
            output.push_str(&format!(
                "{} ({}):\n",
                "COMPATIBLE".green().bold(),
                compatible.len()
            ));
            output.push_str(&TableOutput::format_with_columns(
                &compatible,
                &RecordRow::columns(),
                config,
            ));
            output.push_str("\n\n");
        }

        if !self.syntax_errors.is_empty() {
            output.push_str(&format!(
                "{} ({}):\n",
                "SYNTAX ERRORS".yellow().bold(),
                self.syntax_errors.len()
            ));
            for error in &self.syntax_errors {
                output.push_str(&format!("  {} {}\n", error.file, error.message.dimmed()));
            }
            output.push('\n');
        }

        if let Some(dir) = &self.report_dir {
            output.push_str(&format!("{} {}\n", "Reports written to".dimmed(), dir));
        }

        output.trim_end().to_string()
    }

    fn to_csv(&self, config: &OutputConfig) -> String {
        let mut columns = RecordRow::columns();
        columns.insert(1, Column::new("Category", "category"));
        columns.insert(2, Column::new("Compatible", "compatible"));
        CsvOutput::format_with_columns(&self.rows(None), &columns, config)
    }

    fn to_markdown(&self, _config: &OutputConfig) -> String {
        let sorted = markdown::sort_records(&self.records);
        format!(
            "# API diff: {} -> {}\n\n_{}. Generated {}._\n\n{}",
            self.old_root,
            self.new_root,
            self.summary_text,
            self.generated_at,
            markdown::render_table(&sorted)
        )
    }
}

/// Write the JSON and per-kit markdown reports. Returns the written paths.
pub fn write_reports(dir: &Path, result: &DiffResult) -> anyhow::Result<Vec<PathBuf>> {
    let config = ExportConfig { pretty_print: true };
    let kit_dir = dir.join(KIT_DIR);
    fs::create_dir_all(&kit_dir)
        .with_context(|| format!("Failed to create {}", kit_dir.display()))?;

    let mut files = vec![
        (dir.join(RESULT_FILE), json::export(&result.records, &config)?),
        (
            dir.join(API_CHANGES_FILE),
            json::export_api_changes(&aggregate(&result.records), &config)?,
        ),
        (
            dir.join(SYNTAX_ERRORS_FILE),
            json::export_syntax_errors(&result.syntax_errors, &config)?,
        ),
    ];
    for document in markdown::export_by_kit(&result.records) {
        files.push((kit_dir.join(document.file_name()), document.content));
    }

    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Run the diff command
pub async fn run(
    old: &Path,
    new: &Path,
    options: DiffOptions,
    output_dir: Option<&Path>,
    incompatible_only: bool,
    config: &OutputConfig,
) -> anyhow::Result<()> {
    let result = super::diff_trees(old, new, options).await?;

    let report_dir = match output_dir {
        Some(dir) => {
            let written = write_reports(dir, &result)?;
            tracing::info!("wrote {} report files to {}", written.len(), dir.display());
            Some(dir.display().to_string())
        }
        None => None,
    };

    let mut report = DiffReport::new(old, new, result, incompatible_only);
    report.report_dir = report_dir;
    Output::new(report, config).render()
}
