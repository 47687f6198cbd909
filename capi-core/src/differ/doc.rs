//! Documentation comment differ.
//!
//! Comments are split into tag blocks by a [`CommentParser`], tags are
//! grouped by name and compared occurrence by occurrence. File-level
//! comments get a coarse count check on `@addtogroup` and `@file` blocks
//! before any tag-level comparison.

use std::collections::HashMap;

use super::changes::{DiffKind, DiffRecord};
use super::permission::{PermissionPolicy, RangeChange};
use crate::error::Result;
use crate::parser::{CommentParser, DocBlock, DocTag};
use crate::types::{Node, NodeKind, NA};

/// Tags the differ compares, in comparison order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TagKind {
    Addtogroup,
    Brief,
    Deprecated,
    File,
    Library,
    Param,
    Permission,
    Return,
    Since,
    Syscap,
    LeftBrace,
    RightBrace,
}

impl TagKind {
    const ORDER: [TagKind; 12] = [
        TagKind::Addtogroup,
        TagKind::Brief,
        TagKind::Deprecated,
        TagKind::File,
        TagKind::Library,
        TagKind::Param,
        TagKind::Permission,
        TagKind::Return,
        TagKind::Since,
        TagKind::Syscap,
        TagKind::LeftBrace,
        TagKind::RightBrace,
    ];

    fn tag(&self) -> &'static str {
        match self {
            TagKind::Addtogroup => "addtogroup",
            TagKind::Brief => "brief",
            TagKind::Deprecated => "deprecated",
            TagKind::File => "file",
            TagKind::Library => "library",
            TagKind::Param => "param",
            TagKind::Permission => "permission",
            TagKind::Return => "return",
            TagKind::Since => "since",
            TagKind::Syscap => "syscap",
            TagKind::LeftBrace => "{",
            TagKind::RightBrace => "}",
        }
    }
}

/// Record kinds for a tag compared by presence and one text value.
struct TagKinds {
    added: DiffKind,
    removed: DiffKind,
    changed: DiffKind,
}

/// Compares the documentation of matched declaration pairs.
pub struct DocDiffer<'a> {
    parser: &'a dyn CommentParser,
    policy: &'a dyn PermissionPolicy,
}

/// The old/new pair a tag comparison reports against.
#[derive(Clone, Copy)]
struct Pair<'n> {
    old: &'n Node,
    new: &'n Node,
}

impl<'n> Pair<'n> {
    fn record(&self, kind: DiffKind, old_value: &str, new_value: &str) -> DiffRecord {
        DiffRecord::create(kind, old_value, new_value).with_nodes(Some(self.old), Some(self.new))
    }

    /// Record pointing at the tag line instead of the declaration.
    fn tag_record(
        &self,
        kind: DiffKind,
        old_value: &str,
        new_value: &str,
        old_tag: Option<&DocTag>,
        new_tag: Option<&DocTag>,
    ) -> DiffRecord {
        let line = match (new_tag, old_tag) {
            (Some(tag), _) => self.new.comment_line + tag.line_offset,
            (None, Some(tag)) => self.old.comment_line + tag.line_offset,
            (None, None) => self.old.location.line,
        };
        self.record(kind, old_value, new_value).with_tag_source(
            line,
            old_tag.map(|t| t.source.as_str()),
            new_tag.map(|t| t.source.as_str()),
        )
    }
}

impl<'a> DocDiffer<'a> {
    pub fn new(parser: &'a dyn CommentParser, policy: &'a dyn PermissionPolicy) -> Self {
        Self { parser, policy }
    }

    /// Compare the comments of a matched pair.
    ///
    /// Fails only when a comment cannot be split into blocks.
    pub fn diff(&self, old: &Node, new: &Node, out: &mut Vec<DiffRecord>) -> Result<()> {
        let pair = Pair { old, new };
        let (old_comment, new_comment) = match (&old.comment, &new.comment) {
            (None, None) => return Ok(()),
            (Some(o), Some(n)) if o == n => return Ok(()),
            (None, Some(n)) => {
                out.push(pair.record(DiffKind::AddDoc, NA, n));
                return Ok(());
            }
            (Some(o), None) => {
                out.push(pair.record(DiffKind::ReduceDoc, o, NA));
                return Ok(());
            }
            (Some(o), Some(n)) => (o, n),
        };

        let old_blocks = self.parser.parse(old_comment)?;
        let new_blocks = self.parser.parse(new_comment)?;

        if new.kind == NodeKind::TranslationUnit {
            self.diff_file_blocks(pair, &old_blocks, &new_blocks, out);
            return Ok(());
        }

        if old_blocks.len() > new_blocks.len() {
            out.push(pair.record(DiffKind::ReduceDoc, old_comment, new_comment));
        } else if old_blocks.len() < new_blocks.len() {
            out.push(pair.record(DiffKind::AddDoc, old_comment, new_comment));
        } else if let (Some(o), Some(n)) = (old_blocks.last(), new_blocks.last()) {
            self.diff_block(pair, o, n, out);
            if new.kind == NodeKind::Function {
                param_count_mismatch(pair, o, n, out);
            }
        }
        Ok(())
    }

    fn diff_file_blocks(
        &self,
        pair: Pair<'_>,
        old_blocks: &[DocBlock],
        new_blocks: &[DocBlock],
        out: &mut Vec<DiffRecord>,
    ) {
        let (old_groups, old_files) = group_and_file_blocks(old_blocks);
        let (new_groups, new_files) = group_and_file_blocks(new_blocks);

        let sections = [
            (
                old_groups,
                new_groups,
                DiffKind::DocTagAddtogroupIncrease,
                DiffKind::DocTagAddtogroupDecrease,
            ),
            (
                old_files,
                new_files,
                DiffKind::DocTagFileIncrease,
                DiffKind::DocTagFileDecrease,
            ),
        ];
        for (old_section, new_section, increase, decrease) in sections {
            if old_section.len() > new_section.len() {
                out.push(pair.record(decrease, &file_header(old_blocks), NA));
            } else if old_section.len() < new_section.len() {
                out.push(pair.record(increase, NA, &file_header(new_blocks)));
            } else {
                for (o, n) in old_section.iter().zip(&new_section) {
                    self.diff_block(pair, o, n, out);
                }
            }
        }
    }

    fn diff_block(&self, pair: Pair<'_>, old: &DocBlock, new: &DocBlock, out: &mut Vec<DiffRecord>) {
        let old_tags = tags_by_name(old);
        let new_tags = tags_by_name(new);

        for kind in TagKind::ORDER {
            let empty = Vec::new();
            let old_list = old_tags.get(kind.tag()).unwrap_or(&empty);
            let new_list = new_tags.get(kind.tag()).unwrap_or(&empty);
            let count = old_list.len().max(new_list.len());
            for index in 0..count {
                let o = old_list.get(index).copied();
                let n = new_list.get(index).copied();
                self.diff_tag(pair, kind, o, n, out);
            }
        }
    }

    fn diff_tag(
        &self,
        pair: Pair<'_>,
        kind: TagKind,
        old: Option<&DocTag>,
        new: Option<&DocTag>,
        out: &mut Vec<DiffRecord>,
    ) {
        match kind {
            TagKind::Addtogroup => by_name(pair, &ADDTOGROUP, old, new, false, out),
            TagKind::File => by_name(pair, &FILE, old, new, false, out),
            TagKind::Library => by_name(pair, &LIBRARY, old, new, true, out),
            TagKind::Brief => by_text(pair, &BRIEF, old, new, false, out),
            TagKind::Deprecated => by_text(pair, &DEPRECATED, old, new, false, out),
            TagKind::Since => by_text(pair, &SINCE, old, new, false, out),
            TagKind::Syscap => by_text(pair, &SYSCAP, old, new, true, out),
            TagKind::Param => param(pair, old, new, out),
            TagKind::Permission => self.permission(pair, old, new, out),
            TagKind::Return => {}
            TagKind::LeftBrace => presence(pair, &LEFT_BRACE, old, new, out),
            TagKind::RightBrace => presence(pair, &RIGHT_BRACE, old, new, out),
        }
    }

    fn permission(
        &self,
        pair: Pair<'_>,
        old: Option<&DocTag>,
        new: Option<&DocTag>,
        out: &mut Vec<DiffRecord>,
    ) {
        let (o, n) = match (old, new) {
            (Some(o), Some(n)) => (o, n),
            _ => return by_text(pair, &PERMISSION, old, new, true, out),
        };
        let (old_text, new_text) = (o.full_text(), n.full_text());
        if old_text == new_text {
            return;
        }
        let kind = match self.policy.compare(&old_text, &new_text) {
            RangeChange::Same => return,
            RangeChange::Bigger => DiffKind::DocTagPermissionRangeBigger,
            RangeChange::Smaller => DiffKind::DocTagPermissionRangeSmaller,
            RangeChange::Changed => DiffKind::DocTagPermissionRangeChange,
        };
        out.push(pair.tag_record(kind, &old_text, &new_text, old, new));
    }
}

const ADDTOGROUP: TagKinds = TagKinds {
    added: DiffKind::DocTagAddtogroupNaToHave,
    removed: DiffKind::DocTagAddtogroupHaveToNa,
    changed: DiffKind::DocTagAddtogroupAToB,
};
const BRIEF: TagKinds = TagKinds {
    added: DiffKind::DocTagBriefNaToHave,
    removed: DiffKind::DocTagBriefHaveToNa,
    changed: DiffKind::DocTagBriefAToB,
};
const DEPRECATED: TagKinds = TagKinds {
    added: DiffKind::DocTagDeprecatedNaToHave,
    removed: DiffKind::DocTagDeprecatedHaveToNa,
    changed: DiffKind::DocTagDeprecatedAToB,
};
const FILE: TagKinds = TagKinds {
    added: DiffKind::DocTagFileNaToHave,
    removed: DiffKind::DocTagFileHaveToNa,
    changed: DiffKind::DocTagFileAToB,
};
const LIBRARY: TagKinds = TagKinds {
    added: DiffKind::DocTagLibraryNaToHave,
    removed: DiffKind::DocTagLibraryHaveToNa,
    changed: DiffKind::DocTagLibraryAToB,
};
const PERMISSION: TagKinds = TagKinds {
    added: DiffKind::DocTagPermissionNaToHave,
    removed: DiffKind::DocTagPermissionHaveToNa,
    changed: DiffKind::DocTagPermissionRangeChange,
};
const SINCE: TagKinds = TagKinds {
    added: DiffKind::DocTagSinceNaToHave,
    removed: DiffKind::DocTagSinceHaveToNa,
    changed: DiffKind::DocTagSinceAToB,
};
const SYSCAP: TagKinds = TagKinds {
    added: DiffKind::DocTagSyscapNaToHave,
    removed: DiffKind::DocTagSyscapHaveToNa,
    changed: DiffKind::DocTagSyscapAToB,
};
const LEFT_BRACE: TagKinds = TagKinds {
    added: DiffKind::DocTagLeftBraceNaToHave,
    removed: DiffKind::DocTagLeftBraceHaveToNa,
    changed: DiffKind::DocTagLeftBraceNaToHave,
};
const RIGHT_BRACE: TagKinds = TagKinds {
    added: DiffKind::DocTagRightBraceNaToHave,
    removed: DiffKind::DocTagRightBraceHaveToNa,
    changed: DiffKind::DocTagRightBraceNaToHave,
};

fn push(
    pair: Pair<'_>,
    kind: DiffKind,
    old_value: &str,
    new_value: &str,
    tags: (Option<&DocTag>, Option<&DocTag>),
    with_source: bool,
    out: &mut Vec<DiffRecord>,
) {
    let record = if with_source {
        pair.tag_record(kind, old_value, new_value, tags.0, tags.1)
    } else {
        pair.record(kind, old_value, new_value)
    };
    out.push(record);
}

fn compare_tag(
    pair: Pair<'_>,
    kinds: &TagKinds,
    old: Option<&DocTag>,
    new: Option<&DocTag>,
    text: fn(&DocTag) -> String,
    with_source: bool,
    out: &mut Vec<DiffRecord>,
) {
    match (old, new) {
        (None, None) => {}
        (None, Some(n)) => push(pair, kinds.added, NA, &text(n), (old, new), with_source, out),
        (Some(o), None) => push(pair, kinds.removed, &text(o), NA, (old, new), with_source, out),
        (Some(o), Some(n)) => {
            let (old_text, new_text) = (text(o), text(n));
            if old_text != new_text {
                push(pair, kinds.changed, &old_text, &new_text, (old, new), with_source, out);
            }
        }
    }
}

fn by_name(
    pair: Pair<'_>,
    kinds: &TagKinds,
    old: Option<&DocTag>,
    new: Option<&DocTag>,
    with_source: bool,
    out: &mut Vec<DiffRecord>,
) {
    compare_tag(pair, kinds, old, new, |t| t.name.clone(), with_source, out);
}

fn by_text(
    pair: Pair<'_>,
    kinds: &TagKinds,
    old: Option<&DocTag>,
    new: Option<&DocTag>,
    with_source: bool,
    out: &mut Vec<DiffRecord>,
) {
    compare_tag(pair, kinds, old, new, DocTag::full_text, with_source, out);
}

fn presence(
    pair: Pair<'_>,
    kinds: &TagKinds,
    old: Option<&DocTag>,
    new: Option<&DocTag>,
    out: &mut Vec<DiffRecord>,
) {
    match (old, new) {
        (None, Some(n)) => out.push(pair.record(kinds.added, NA, &n.name)),
        (Some(o), None) => out.push(pair.record(kinds.removed, &o.name, NA)),
        _ => {}
    }
}

fn param(pair: Pair<'_>, old: Option<&DocTag>, new: Option<&DocTag>, out: &mut Vec<DiffRecord>) {
    match (old, new) {
        (None, None) => {}
        (None, Some(n)) => out.push(pair.record(DiffKind::DocTagParamNaToHave, NA, &n.name)),
        (Some(o), None) => out.push(pair.record(DiffKind::DocTagParamHaveToNa, &o.name, NA)),
        (Some(o), Some(n)) => {
            if o.name != n.name {
                out.push(pair.record(DiffKind::DocTagParamNameAToB, &o.name, &n.name));
            }
            if o.description != n.description {
                out.push(pair.record(DiffKind::DocTagParamAToB, &o.description, &n.description));
            }
        }
    }
}

/// Flags functions whose `@param` tags disagree with the parameter count
/// on both sides.
fn param_count_mismatch(pair: Pair<'_>, old: &DocBlock, new: &DocBlock, out: &mut Vec<DiffRecord>) {
    let old_tags = old.tags_named("param").count();
    let new_tags = new.tags_named("param").count();
    let old_params = pair.old.children.len();
    let new_params = pair.new.children.len();
    if old_tags != old_params && new_tags != new_params {
        out.push(pair.record(
            DiffKind::DocTagParamCountMismatch,
            &format!("{} @param tags for {} params", old_tags, old_params),
            &format!("{} @param tags for {} params", new_tags, new_params),
        ));
    }
}

fn tags_by_name(block: &DocBlock) -> HashMap<&str, Vec<&DocTag>> {
    let mut grouped: HashMap<&str, Vec<&DocTag>> = HashMap::new();
    for tag in &block.tags {
        grouped.entry(tag.tag.as_str()).or_default().push(tag);
    }
    grouped
}

/// File header text: every block except lone `@}` group closers, one per line.
fn file_header(blocks: &[DocBlock]) -> String {
    blocks
        .iter()
        .filter(|b| !(b.tags.len() == 1 && b.tags[0].tag == "}" && b.description.is_empty()))
        .map(|b| format!("{}\n", b.source))
        .collect()
}

/// Split file-level blocks into `@addtogroup` blocks and `@file` blocks.
/// A block belongs to whichever of the two tags appears in it first.
fn group_and_file_blocks(blocks: &[DocBlock]) -> (Vec<&DocBlock>, Vec<&DocBlock>) {
    let mut groups = Vec::new();
    let mut files = Vec::new();
    for block in blocks {
        let first = block
            .tags
            .iter()
            .find(|t| t.tag == "addtogroup" || t.tag == "file");
        match first.map(|t| t.tag.as_str()) {
            Some("addtogroup") => groups.push(block),
            Some("file") => files.push(block),
            _ => {}
        }
    }
    (groups, files)
}
