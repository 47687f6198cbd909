//! Report exporters.
//!
//! - [`json`]: flat record list, per-API aggregate rows, syntax errors
//! - [`markdown`]: one table per kit

pub mod json;
pub mod markdown;

/// Exporter options.
#[derive(Clone, Debug, Default)]
pub struct ExportConfig {
    pub pretty_print: bool,
}
