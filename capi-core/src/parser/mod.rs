//! Header parsing module.
//!
//! The [`AstProvider`] trait is the boundary between the diff engine and
//! whatever front end turns header text into a [`Node`] tree. The bundled
//! provider uses the tree-sitter C grammar. Documentation comments are
//! split into tags by a [`CommentParser`].

use crate::error::Result;
use crate::types::Node;

pub mod c_header;
pub mod doc;

mod helpers;

pub use c_header::CHeaderProvider;
pub use doc::{CommentParser, DocBlock, DocTag, DoxygenParser};

/// Produces a translation-unit node for one header file.
///
/// `path` is the header path relative to the scanned root; it is used for
/// node locations and unique ids. Syntax problems that still leave a usable
/// tree are reported through the root node's `syntax_error`; an `Err` means
/// no tree could be built at all.
pub trait AstProvider: Send + Sync {
    fn parse(&self, source: &str, path: &str) -> Result<Node>;
}

/// Parse a header with the bundled tree-sitter provider.
pub fn parse_header(source: &str, path: &str) -> Result<Node> {
    c_header::parse(source, path)
}
