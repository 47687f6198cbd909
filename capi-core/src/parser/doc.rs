//! Doxygen comment-tag parsing.
//!
//! Splits a raw comment into `/** ... */` blocks and each block into
//! `@tag name description` entries. Continuation lines extend the
//! description of the tag above them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CapiError, Result};

/// `@tag name description`, each part after the tag optional.
static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@\s*(\S+)(?:\s+(\S+)(?:\s+(.*))?)?$").unwrap());

/// One `@tag` occurrence inside a doc block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTag {
    /// Tag name without the `@`, e.g. `since`, `param`, `{`.
    pub tag: String,
    /// First word after the tag.
    pub name: String,
    /// Remaining text, continuation lines joined by spaces.
    pub description: String,
    /// Zero-based line of the tag within the raw comment.
    pub line_offset: u32,
    /// The tag line as written, without the leading `*`.
    pub source: String,
}

impl DocTag {
    /// `name description` with the separator omitted when either is empty.
    pub fn full_text(&self) -> String {
        match (self.name.is_empty(), self.description.is_empty()) {
            (_, true) => self.name.clone(),
            (true, false) => self.description.clone(),
            (false, false) => format!("{} {}", self.name, self.description),
        }
    }
}

/// A single `/** ... */` block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBlock {
    /// Raw block text including delimiters.
    pub source: String,
    /// Free text before the first tag.
    pub description: String,
    pub tags: Vec<DocTag>,
}

impl DocBlock {
    pub fn tags_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DocTag> + 'a {
        self.tags.iter().filter(move |t| t.tag == tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.tag == tag)
    }
}

/// Turns raw comment text into ordered tag blocks.
pub trait CommentParser: Send + Sync {
    fn parse(&self, comment: &str) -> Result<Vec<DocBlock>>;
}

/// Parser for Doxygen-style `/** */` and `///` comments.
#[derive(Clone, Copy, Debug, Default)]
pub struct DoxygenParser;

impl CommentParser for DoxygenParser {
    fn parse(&self, comment: &str) -> Result<Vec<DocBlock>> {
        if !comment.contains("/**") {
            return Ok(parse_line_comments(comment).into_iter().collect());
        }

        let mut blocks = Vec::new();
        let mut pos = 0;
        while let Some(found) = comment[pos..].find("/**") {
            let start = pos + found;
            let end = match comment[start + 2..].find("*/") {
                Some(rel) => start + 2 + rel,
                None => {
                    let line = comment[..start].matches('\n').count() + 1;
                    return Err(CapiError::CommentParse {
                        message: format!("unterminated doc block starting at comment line {}", line),
                    });
                }
            };
            let base_line = comment[..start].matches('\n').count() as u32;
            let body = if end > start + 3 { &comment[start + 3..end] } else { "" };
            let mut block = parse_body(body.lines(), base_line);
            block.source = comment[start..end + 2].to_string();
            blocks.push(block);
            pos = end + 2;
        }
        Ok(blocks)
    }
}

fn parse_line_comments(comment: &str) -> Option<DocBlock> {
    let lines: Vec<&str> = comment
        .lines()
        .filter_map(|l| l.trim_start().strip_prefix("///"))
        .collect();
    if lines.is_empty() {
        return None;
    }
    let mut block = parse_body(lines.into_iter(), 0);
    block.source = comment.to_string();
    Some(block)
}

fn parse_body<'a>(lines: impl Iterator<Item = &'a str>, base_line: u32) -> DocBlock {
    let mut block = DocBlock::default();
    let mut description: Vec<&str> = Vec::new();

    for (index, raw) in lines.enumerate() {
        let line = strip_decoration(raw);
        if line.is_empty() {
            continue;
        }

        if line.starts_with('@') {
            let Some(caps) = TAG_LINE.captures(line) else {
                continue;
            };
            let part = |i: usize| caps.get(i).map_or("", |m| m.as_str().trim());
            block.tags.push(DocTag {
                tag: part(1).to_string(),
                name: part(2).to_string(),
                description: part(3).to_string(),
                line_offset: base_line + index as u32,
                source: line.to_string(),
            });
        } else if let Some(current) = block.tags.last_mut() {
            if current.description.is_empty() {
                current.description = line.to_string();
            } else {
                current.description.push(' ');
                current.description.push_str(line);
            }
        } else {
            description.push(line);
        }
    }

    block.description = description.join(" ");
    block
}

/// Remove leading whitespace and `*` gutters from a comment line.
fn strip_decoration(line: &str) -> &str {
    let trimmed = line.trim_start();
    let trimmed = trimmed.trim_start_matches('*');
    trimmed.trim()
}
