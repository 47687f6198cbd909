//! Markdown format exporter.
//!
//! Records are grouped into one document per kit. Within a kit rows are
//! ordered by file path, change category and kind name.

use crate::differ::DiffRecord;

/// Document name used for records without a kit.
pub const NO_KIT: &str = "nullOfKit";

/// A rendered per-kit document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KitDocument {
    pub kit: String,
    pub content: String,
}

impl KitDocument {
    pub fn file_name(&self) -> String {
        format!("{}.md", self.kit)
    }
}

/// Sort records by kit, file path, category and kind name.
pub fn sort_records<'a>(records: impl IntoIterator<Item = &'a DiffRecord>) -> Vec<&'a DiffRecord> {
    let mut sorted: Vec<&DiffRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.kit_name
            .cmp(&b.kit_name)
            .then_with(|| a.path().cmp(b.path()))
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
    });
    sorted
}

/// Render one document per kit, in kit order.
pub fn export_by_kit(records: &[DiffRecord]) -> Vec<KitDocument> {
    let sorted = sort_records(records);
    let mut documents: Vec<KitDocument> = Vec::new();

    let mut start = 0;
    while start < sorted.len() {
        let kit_name = &sorted[start].kit_name;
        let end = sorted[start..]
            .iter()
            .position(|r| &r.kit_name != kit_name)
            .map_or(sorted.len(), |offset| start + offset);
        let kit = if kit_name.is_empty() { NO_KIT.to_string() } else { kit_name.clone() };
        documents.push(KitDocument {
            kit,
            content: render_table(&sorted[start..end]),
        });
        start = end;
    }
    documents
}

/// Render records as a markdown table.
pub fn render_table(records: &[&DiffRecord]) -> String {
    let mut output = String::from("|operation|old|new|file|\n|---|---|---|---|\n");
    for record in records {
        output.push_str(&format!(
            "|{}|{}|{}|{}|\n",
            record.kind.as_str(),
            cell(&record.old_full_text),
            cell(&record.new_full_text),
            cell(record.path()),
        ));
    }
    output
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', "<br />")
}
