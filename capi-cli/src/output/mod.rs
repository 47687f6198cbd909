//! Output formatting module for the capi CLI
//!
//! Provides unified output formatting across all commands with support for
//! multiple formats: table (human-readable), json (machine-readable), csv
//! and markdown.
//!
//! Automatically detects TTY context to adjust colors and truncation behavior.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod csv;
mod json;
mod markdown;
mod table;

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::markdown::MarkdownOutput;
pub use self::table::{AsTable, TableOutput};

/// Output format for CLI results
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,
    /// JSON format for machine consumption
    Json,
    /// CSV format for spreadsheet/data processing
    Csv,
    /// Markdown tables for reports and pull requests
    Markdown,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Configuration for output rendering
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// The output format to use
    pub format: OutputFormat,
    /// Disable colored output
    pub no_color: bool,
    /// Disable truncation of long values
    pub no_truncate: bool,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
            no_truncate: false,
        }
    }

    /// Create an OutputConfig with automatic TTY detection and optional color override.
    ///
    /// When output is not a TTY (piped or redirected), truncation is disabled
    /// and colors are off unless `color_override` is `Some(true)`.
    pub fn auto_detect(format: OutputFormat, color_override: Option<bool>) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let mut config = Self::new(format);
        if !color_override.unwrap_or(is_tty) {
            config = config.without_colors();
        }
        if !is_tty {
            config = config.without_truncation();
        }
        config
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }

    pub fn should_truncate(&self) -> bool {
        !self.no_truncate
    }

    /// Builder: disable colors
    pub fn without_colors(mut self) -> Self {
        self.no_color = true;
        self
    }

    /// Builder: disable truncation
    pub fn without_truncation(mut self) -> Self {
        self.no_truncate = true;
        self
    }
}

/// Column definition for tabular output
#[derive(Debug, Clone)]
pub struct Column {
    /// Display name for the column header
    pub name: String,
    /// Key of the serialized field holding the value
    pub key: String,
    /// Maximum width for this column (None = no limit)
    pub max_width: Option<usize>,
    pub align: Alignment,
}

impl Column {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            max_width: None,
            align: Alignment::Left,
        }
    }

    /// Builder: set maximum width
    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Builder: set alignment
    pub fn with_alignment(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }
}

/// Text alignment for columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// Trait for types that can be formatted as output
///
/// Types implementing this trait can be rendered in any supported format.
pub trait Outputter: Serialize + Sized {
    /// Render as table format
    fn to_table(&self, config: &OutputConfig) -> String;

    /// Render as JSON format
    fn to_json(&self, config: &OutputConfig) -> String {
        JsonOutput::format(self, config)
    }

    /// Render as CSV format
    fn to_csv(&self, config: &OutputConfig) -> String;

    /// Render as markdown
    fn to_markdown(&self, config: &OutputConfig) -> String;

    /// Render using the format specified in config
    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
            OutputFormat::Csv => self.to_csv(config),
            OutputFormat::Markdown => self.to_markdown(config),
        }
    }

    /// Render and print to stdout
    fn output(&self, config: &OutputConfig) {
        println!("{}", self.render(config));
    }
}

/// Result wrapper for formatted output with automatic format selection
pub struct Output<T> {
    data: T,
    config: OutputConfig,
}

impl<T: Outputter> Output<T> {
    pub fn new(data: T, config: &OutputConfig) -> Self {
        Self {
            data,
            config: config.clone(),
        }
    }

    /// Render the output to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        self.data.output(&self.config);
        Ok(())
    }
}

// ============================================================================
// Utility functions
// ============================================================================

/// Truncate a string to a maximum width with ellipsis
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let truncated: String = s.chars().take(max_width - 3).collect();
        format!("{}...", truncated)
    }
}

/// Get terminal width, defaulting to 80 if unavailable
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}

/// Local timestamp stamped into report headers.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("OH_Foo", 10), "OH_Foo");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("int OH_Net_Open(void)", 10), "int OH_...");
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("ééé", 3), "ééé");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_config_builder() {
        let config = OutputConfig::new(OutputFormat::Csv)
            .without_colors()
            .without_truncation();

        assert_eq!(config.format, OutputFormat::Csv);
        assert!(!config.use_colors());
        assert!(!config.should_truncate());
    }

    #[test]
    fn test_output_renders_selected_format() {
        #[derive(Serialize)]
        struct Count {
            changes: u32,
        }

        impl Outputter for Count {
            fn to_table(&self, _config: &OutputConfig) -> String {
                format!("{} changes", self.changes)
            }

            fn to_csv(&self, _config: &OutputConfig) -> String {
                format!("changes\n{}", self.changes)
            }

            fn to_markdown(&self, _config: &OutputConfig) -> String {
                format!("**{}** changes", self.changes)
            }
        }

        let count = Count { changes: 3 };
        let rendered = count.render(&OutputConfig::new(OutputFormat::Json));
        assert!(rendered.contains("\"changes\": 3"));

        let md = OutputConfig::new(OutputFormat::Markdown);
        assert_eq!(count.render(&md), "**3** changes");
        assert_eq!(count.render(&md.clone().without_colors()), "**3** changes");
    }

    #[test]
    fn test_column_builder() {
        let col = Column::new("Line", "line")
            .with_max_width(6)
            .with_alignment(Alignment::Right);

        assert_eq!(col.key, "line");
        assert_eq!(col.max_width, Some(6));
        assert_eq!(col.align, Alignment::Right);
    }
}
