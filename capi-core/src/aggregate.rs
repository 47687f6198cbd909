//! Per-declaration aggregation of diff records.
//!
//! Every record belongs to a top-level declaration (its owner). Grouping
//! by owner yields one [`ApiChange`] row per touched API, with the textual
//! fields of all its records joined by [`JOIN_SEPARATOR`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::differ::{ChangeCategory, DiffRecord};
use crate::types::{ApiSource, NodeKind};

pub const JOIN_SEPARATOR: &str = "#&#";

/// Which change categories occurred for one API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub api_added: bool,
    pub api_removed: bool,
    pub doc_change: bool,
    pub prototype_change: bool,
    pub constraint_change: bool,
    /// Both prototype and constraint changes occurred.
    pub modified: bool,
}

impl CategoryTally {
    fn mark(&mut self, category: ChangeCategory) {
        match category {
            ChangeCategory::ApiAdded => self.api_added = true,
            ChangeCategory::ApiRemoved => self.api_removed = true,
            ChangeCategory::NonApiDocChange => self.doc_change = true,
            ChangeCategory::PrototypeChange => self.prototype_change = true,
            ChangeCategory::ConstraintChange => self.constraint_change = true,
        }
        self.modified = self.prototype_change && self.constraint_change;
    }
}

/// All changes of a single top-level declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiChange {
    pub api_name: String,
    pub unique_id: String,
    pub api_kind: Option<NodeKind>,
    pub kit_name: String,
    pub sub_system: String,
    pub is_api_change: bool,
    pub is_system_api: bool,
    pub api_source: ApiSource,

    pub diff_kinds: String,
    pub categories: String,
    pub old_text: String,
    pub new_text: String,
    pub compatible_flags: String,

    pub compatible_count: usize,
    pub incompatible_count: usize,
    pub tally: CategoryTally,
}

impl ApiChange {
    fn start(record: &DiffRecord) -> Self {
        let mut change = Self {
            api_name: record.owner_name.clone(),
            unique_id: record.owner_unique_id.clone(),
            api_kind: record.owner_kind,
            kit_name: record.kit_name.clone(),
            sub_system: record.sub_system.clone(),
            is_api_change: record.is_api_change,
            is_system_api: record.is_system_api,
            api_source: record.api_source,
            diff_kinds: record.kind.as_str().to_string(),
            categories: record.category.label().to_string(),
            old_text: record.old_full_text.clone(),
            new_text: record.new_full_text.clone(),
            compatible_flags: record.is_compatible.to_string(),
            compatible_count: 0,
            incompatible_count: 0,
            tally: CategoryTally::default(),
        };
        change.count(record);
        change
    }

    fn extend(&mut self, record: &DiffRecord) {
        join(&mut self.diff_kinds, record.kind.as_str());
        join(&mut self.categories, record.category.label());
        join(&mut self.old_text, &record.old_full_text);
        join(&mut self.new_text, &record.new_full_text);
        join(&mut self.compatible_flags, if record.is_compatible { "true" } else { "false" });
        self.count(record);
    }

    fn count(&mut self, record: &DiffRecord) {
        if record.is_compatible {
            self.compatible_count += 1;
        } else {
            self.incompatible_count += 1;
        }
        self.tally.mark(record.category);
    }

    pub fn record_count(&self) -> usize {
        self.compatible_count + self.incompatible_count
    }
}

fn join(target: &mut String, value: &str) {
    target.push_str(JOIN_SEPARATOR);
    target.push_str(value);
}

/// Group records by owning declaration, in first-seen order.
pub fn aggregate<'a>(records: impl IntoIterator<Item = &'a DiffRecord>) -> Vec<ApiChange> {
    let mut rows: Vec<ApiChange> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = if record.owner_unique_id.is_empty() {
            record.unique_id.clone()
        } else {
            record.owner_unique_id.clone()
        };
        match index.get(&key) {
            Some(&row) => rows[row].extend(record),
            None => {
                index.insert(key, rows.len());
                rows.push(ApiChange::start(record));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::DiffKind;
    use crate::types::Node;

    fn make_record(kind: DiffKind, owner: &str) -> DiffRecord {
        let mut node = Node::new(NodeKind::Function, owner);
        node.unique_id = format!("a.h#{}", owner);
        DiffRecord::create(kind, "old", "new")
            .with_nodes(Some(&node), Some(&node))
            .with_owner(&node)
    }

    #[test]
    fn test_groups_by_owner_in_order() {
        let records = vec![
            make_record(DiffKind::FunctionReturnChange, "OH_B"),
            make_record(DiffKind::AddApi, "OH_A"),
            make_record(DiffKind::FunctionParamNameChange, "OH_B"),
        ];
        let rows = aggregate(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].api_name, "OH_B");
        assert_eq!(rows[0].record_count(), 2);
        assert_eq!(
            rows[0].diff_kinds,
            "FUNCTION_RETURN_CHANGE#&#FUNCTION_PARAM_NAME_CHANGE"
        );
        assert_eq!(rows[0].compatible_flags, "false#&#true");
        assert_eq!(rows[0].incompatible_count, 1);
        assert_eq!(rows[1].api_name, "OH_A");
        assert!(rows[1].tally.api_added);
    }

    #[test]
    fn test_modified_needs_both_categories() {
        let records = vec![
            make_record(DiffKind::FunctionReturnChange, "OH_A"),
            make_record(DiffKind::DocTagSinceAToB, "OH_A"),
        ];
        let rows = aggregate(&records);
        assert!(rows[0].tally.prototype_change);
        assert!(rows[0].tally.constraint_change);
        assert!(rows[0].tally.modified);

        let rows = aggregate(&records[..1]);
        assert!(!rows[0].tally.modified);
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<DiffRecord> = Vec::new();
        assert!(aggregate(&records).is_empty());
    }
}
