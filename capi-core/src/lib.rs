//! capi-core - structural diff and compatibility engine for C API headers.
//!
//! Compares two versions of a tree of C header files declaration by
//! declaration and classifies every difference as compatible or
//! incompatible for existing callers.
//!
//! # Features
//!
//! - **Header parsing**: tree-sitter C front end producing a normalized node tree
//! - **Identity matching**: declarations paired across versions by name and kind
//! - **Declaration and doc diffs**: prototypes, members, values and Doxygen tags
//! - **Compatibility rules**: exhaustive kind classification plus violation checks
//! - **Parallel traversal**: changed headers diffed concurrently via Rayon
//! - **Exports**: JSON records, per-API aggregates and per-kit markdown
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use capi_core::{DiffEngine, DiffOptions};
//!
//! let engine = DiffEngine::new(DiffOptions::default());
//! let result = engine.diff_dirs(Path::new("sdk-old"), Path::new("sdk-new")).unwrap();
//! for record in result.incompatible() {
//!     println!("{} {}: {}", record.path(), record.kind.as_str(), record.new_value);
//! }
//! ```

pub mod aggregate;
pub mod classify;
pub mod differ;
pub mod error;
pub mod exporter;
pub mod orchestrator;
pub mod parser;
pub mod types;

pub use aggregate::{aggregate, ApiChange};
pub use classify::{check_compatibility, classify, Finding, Rule, RULES};
pub use differ::{ChangeCategory, DiffKind, DiffRecord, DiffResult};
pub use error::{CapiError, Result};
pub use orchestrator::{DiffEngine, DiffOptions, DEFAULT_IGNORED_DIRS};
pub use types::{KitMapping, Node, NodeKind, SyntaxError, NA};
