//! Change records and result structures for header diffs.

use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::types::{ApiSource, Location, Node, NodeKind, SyntaxError};

/// Every kind of difference the differs can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffKind {
    AddApi,
    ReduceApi,
    AddDoc,
    ReduceDoc,
    FunctionReturnChange,
    FunctionParamNameChange,
    FunctionParamTypeChange,
    FunctionParamAdd,
    FunctionParamReduce,
    FunctionParamPosChange,
    DefineNameChange,
    DefineTextChange,
    StructNameChange,
    StructMemberNameChange,
    StructMemberTypeChange,
    StructMemberAdd,
    StructMemberReduce,
    UnionNameChange,
    UnionMemberNameChange,
    UnionMemberTypeChange,
    UnionMemberAdd,
    UnionMemberReduce,
    EnumNameChange,
    EnumMemberNameChange,
    EnumMemberValueChange,
    EnumMemberAdd,
    EnumMemberReduce,
    VariableNameChange,
    VariableTypeChange,
    VariableValueChange,
    VariableChangeToConstant,
    ConstantNameChange,
    ConstantTypeChange,
    ConstantValueChange,
    ConstantChangeToVariable,
    TypedefNameTypeChange,
    DocTagAddtogroupNaToHave,
    DocTagAddtogroupHaveToNa,
    DocTagAddtogroupAToB,
    DocTagBriefNaToHave,
    DocTagBriefHaveToNa,
    DocTagBriefAToB,
    DocTagDeprecatedNaToHave,
    DocTagDeprecatedHaveToNa,
    DocTagDeprecatedAToB,
    DocTagFileNaToHave,
    DocTagFileHaveToNa,
    DocTagFileAToB,
    DocTagLibraryNaToHave,
    DocTagLibraryHaveToNa,
    DocTagLibraryAToB,
    DocTagParamNaToHave,
    DocTagParamHaveToNa,
    DocTagParamNameAToB,
    DocTagParamAToB,
    DocTagParamCountMismatch,
    DocTagPermissionNaToHave,
    DocTagPermissionHaveToNa,
    DocTagPermissionRangeBigger,
    DocTagPermissionRangeSmaller,
    DocTagPermissionRangeChange,
    DocTagSinceNaToHave,
    DocTagSinceHaveToNa,
    DocTagSinceAToB,
    DocTagSyscapNaToHave,
    DocTagSyscapHaveToNa,
    DocTagSyscapAToB,
    DocTagLeftBraceNaToHave,
    DocTagLeftBraceHaveToNa,
    DocTagRightBraceNaToHave,
    DocTagRightBraceHaveToNa,
    DocTagAddtogroupIncrease,
    DocTagAddtogroupDecrease,
    DocTagFileIncrease,
    DocTagFileDecrease,
}

impl DiffKind {
    pub const ALL: [DiffKind; 75] = [
        DiffKind::AddApi,
        DiffKind::ReduceApi,
        DiffKind::AddDoc,
        DiffKind::ReduceDoc,
        DiffKind::FunctionReturnChange,
        DiffKind::FunctionParamNameChange,
        DiffKind::FunctionParamTypeChange,
        DiffKind::FunctionParamAdd,
        DiffKind::FunctionParamReduce,
        DiffKind::FunctionParamPosChange,
        DiffKind::DefineNameChange,
        DiffKind::DefineTextChange,
        DiffKind::StructNameChange,
        DiffKind::StructMemberNameChange,
        DiffKind::StructMemberTypeChange,
        DiffKind::StructMemberAdd,
        DiffKind::StructMemberReduce,
        DiffKind::UnionNameChange,
        DiffKind::UnionMemberNameChange,
        DiffKind::UnionMemberTypeChange,
        DiffKind::UnionMemberAdd,
        DiffKind::UnionMemberReduce,
        DiffKind::EnumNameChange,
        DiffKind::EnumMemberNameChange,
        DiffKind::EnumMemberValueChange,
        DiffKind::EnumMemberAdd,
        DiffKind::EnumMemberReduce,
        DiffKind::VariableNameChange,
        DiffKind::VariableTypeChange,
        DiffKind::VariableValueChange,
        DiffKind::VariableChangeToConstant,
        DiffKind::ConstantNameChange,
        DiffKind::ConstantTypeChange,
        DiffKind::ConstantValueChange,
        DiffKind::ConstantChangeToVariable,
        DiffKind::TypedefNameTypeChange,
        DiffKind::DocTagAddtogroupNaToHave,
        DiffKind::DocTagAddtogroupHaveToNa,
        DiffKind::DocTagAddtogroupAToB,
        DiffKind::DocTagBriefNaToHave,
        DiffKind::DocTagBriefHaveToNa,
        DiffKind::DocTagBriefAToB,
        DiffKind::DocTagDeprecatedNaToHave,
        DiffKind::DocTagDeprecatedHaveToNa,
        DiffKind::DocTagDeprecatedAToB,
        DiffKind::DocTagFileNaToHave,
        DiffKind::DocTagFileHaveToNa,
        DiffKind::DocTagFileAToB,
        DiffKind::DocTagLibraryNaToHave,
        DiffKind::DocTagLibraryHaveToNa,
        DiffKind::DocTagLibraryAToB,
        DiffKind::DocTagParamNaToHave,
        DiffKind::DocTagParamHaveToNa,
        DiffKind::DocTagParamNameAToB,
        DiffKind::DocTagParamAToB,
        DiffKind::DocTagParamCountMismatch,
        DiffKind::DocTagPermissionNaToHave,
        DiffKind::DocTagPermissionHaveToNa,
        DiffKind::DocTagPermissionRangeBigger,
        DiffKind::DocTagPermissionRangeSmaller,
        DiffKind::DocTagPermissionRangeChange,
        DiffKind::DocTagSinceNaToHave,
        DiffKind::DocTagSinceHaveToNa,
        DiffKind::DocTagSinceAToB,
        DiffKind::DocTagSyscapNaToHave,
        DiffKind::DocTagSyscapHaveToNa,
        DiffKind::DocTagSyscapAToB,
        DiffKind::DocTagLeftBraceNaToHave,
        DiffKind::DocTagLeftBraceHaveToNa,
        DiffKind::DocTagRightBraceNaToHave,
        DiffKind::DocTagRightBraceHaveToNa,
        DiffKind::DocTagAddtogroupIncrease,
        DiffKind::DocTagAddtogroupDecrease,
        DiffKind::DocTagFileIncrease,
        DiffKind::DocTagFileDecrease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffKind::AddApi => "ADD_API",
            DiffKind::ReduceApi => "REDUCE_API",
            DiffKind::AddDoc => "ADD_DOC",
            DiffKind::ReduceDoc => "REDUCE_DOC",
            DiffKind::FunctionReturnChange => "FUNCTION_RETURN_CHANGE",
            DiffKind::FunctionParamNameChange => "FUNCTION_PARAM_NAME_CHANGE",
            DiffKind::FunctionParamTypeChange => "FUNCTION_PARAM_TYPE_CHANGE",
            DiffKind::FunctionParamAdd => "FUNCTION_PARAM_ADD",
            DiffKind::FunctionParamReduce => "FUNCTION_PARAM_REDUCE",
            DiffKind::FunctionParamPosChange => "FUNCTION_PARAM_POS_CHANGE",
            DiffKind::DefineNameChange => "DEFINE_NAME_CHANGE",
            DiffKind::DefineTextChange => "DEFINE_TEXT_CHANGE",
            DiffKind::StructNameChange => "STRUCT_NAME_CHANGE",
            DiffKind::StructMemberNameChange => "STRUCT_MEMBER_NAME_CHANGE",
            DiffKind::StructMemberTypeChange => "STRUCT_MEMBER_TYPE_CHANGE",
            DiffKind::StructMemberAdd => "STRUCT_MEMBER_ADD",
            DiffKind::StructMemberReduce => "STRUCT_MEMBER_REDUCE",
            DiffKind::UnionNameChange => "UNION_NAME_CHANGE",
            DiffKind::UnionMemberNameChange => "UNION_MEMBER_NAME_CHANGE",
            DiffKind::UnionMemberTypeChange => "UNION_MEMBER_TYPE_CHANGE",
            DiffKind::UnionMemberAdd => "UNION_MEMBER_ADD",
            DiffKind::UnionMemberReduce => "UNION_MEMBER_REDUCE",
            DiffKind::EnumNameChange => "ENUM_NAME_CHANGE",
            DiffKind::EnumMemberNameChange => "ENUM_MEMBER_NAME_CHANGE",
            DiffKind::EnumMemberValueChange => "ENUM_MEMBER_VALUE_CHANGE",
            DiffKind::EnumMemberAdd => "ENUM_MEMBER_ADD",
            DiffKind::EnumMemberReduce => "ENUM_MEMBER_REDUCE",
            DiffKind::VariableNameChange => "VARIABLE_NAME_CHANGE",
            DiffKind::VariableTypeChange => "VARIABLE_TYPE_CHANGE",
            DiffKind::VariableValueChange => "VARIABLE_VALUE_CHANGE",
            DiffKind::VariableChangeToConstant => "VARIABLE_CHANGE_TO_CONSTANT",
            DiffKind::ConstantNameChange => "CONSTANT_NAME_CHANGE",
            DiffKind::ConstantTypeChange => "CONSTANT_TYPE_CHANGE",
            DiffKind::ConstantValueChange => "CONSTANT_VALUE_CHANGE",
            DiffKind::ConstantChangeToVariable => "CONSTANT_CHANGE_TO_VARIABLE",
            DiffKind::TypedefNameTypeChange => "TYPEDEF_NAME_TYPE_CHANGE",
            DiffKind::DocTagAddtogroupNaToHave => "DOC_TAG_ADDTOGROUP_NA_TO_HAVE",
            DiffKind::DocTagAddtogroupHaveToNa => "DOC_TAG_ADDTOGROUP_HAVE_TO_NA",
            DiffKind::DocTagAddtogroupAToB => "DOC_TAG_ADDTOGROUP_A_TO_B",
            DiffKind::DocTagBriefNaToHave => "DOC_TAG_BRIEF_NA_TO_HAVE",
            DiffKind::DocTagBriefHaveToNa => "DOC_TAG_BRIEF_HAVE_TO_NA",
            DiffKind::DocTagBriefAToB => "DOC_TAG_BRIEF_A_TO_B",
            DiffKind::DocTagDeprecatedNaToHave => "DOC_TAG_DEPRECATED_NA_TO_HAVE",
            DiffKind::DocTagDeprecatedHaveToNa => "DOC_TAG_DEPRECATED_HAVE_TO_NA",
            DiffKind::DocTagDeprecatedAToB => "DOC_TAG_DEPRECATED_A_TO_B",
            DiffKind::DocTagFileNaToHave => "DOC_TAG_FILE_NA_TO_HAVE",
            DiffKind::DocTagFileHaveToNa => "DOC_TAG_FILE_HAVE_TO_NA",
            DiffKind::DocTagFileAToB => "DOC_TAG_FILE_A_TO_B",
            DiffKind::DocTagLibraryNaToHave => "DOC_TAG_LIBRARY_NA_TO_HAVE",
            DiffKind::DocTagLibraryHaveToNa => "DOC_TAG_LIBRARY_HAVE_TO_NA",
            DiffKind::DocTagLibraryAToB => "DOC_TAG_LIBRARY_A_TO_B",
            DiffKind::DocTagParamNaToHave => "DOC_TAG_PARAM_NA_TO_HAVE",
            DiffKind::DocTagParamHaveToNa => "DOC_TAG_PARAM_HAVE_TO_NA",
            DiffKind::DocTagParamNameAToB => "DOC_TAG_PARAM_NAME_A_TO_B",
            DiffKind::DocTagParamAToB => "DOC_TAG_PARAM_A_TO_B",
            DiffKind::DocTagParamCountMismatch => "DOC_TAG_PARAM_COUNT_MISMATCH",
            DiffKind::DocTagPermissionNaToHave => "DOC_TAG_PERMISSION_NA_TO_HAVE",
            DiffKind::DocTagPermissionHaveToNa => "DOC_TAG_PERMISSION_HAVE_TO_NA",
            DiffKind::DocTagPermissionRangeBigger => "DOC_TAG_PERMISSION_RANGE_BIGGER",
            DiffKind::DocTagPermissionRangeSmaller => "DOC_TAG_PERMISSION_RANGE_SMALLER",
            DiffKind::DocTagPermissionRangeChange => "DOC_TAG_PERMISSION_RANGE_CHANGE",
            DiffKind::DocTagSinceNaToHave => "DOC_TAG_SINCE_NA_TO_HAVE",
            DiffKind::DocTagSinceHaveToNa => "DOC_TAG_SINCE_HAVE_TO_NA",
            DiffKind::DocTagSinceAToB => "DOC_TAG_SINCE_A_TO_B",
            DiffKind::DocTagSyscapNaToHave => "DOC_TAG_SYSCAP_NA_TO_HAVE",
            DiffKind::DocTagSyscapHaveToNa => "DOC_TAG_SYSCAP_HAVE_TO_NA",
            DiffKind::DocTagSyscapAToB => "DOC_TAG_SYSCAP_A_TO_B",
            DiffKind::DocTagLeftBraceNaToHave => "DOC_TAG_LEFT_BRACE_NA_TO_HAVE",
            DiffKind::DocTagLeftBraceHaveToNa => "DOC_TAG_LEFT_BRACE_HAVE_TO_NA",
            DiffKind::DocTagRightBraceNaToHave => "DOC_TAG_RIGHT_BRACE_NA_TO_HAVE",
            DiffKind::DocTagRightBraceHaveToNa => "DOC_TAG_RIGHT_BRACE_HAVE_TO_NA",
            DiffKind::DocTagAddtogroupIncrease => "DOC_TAG_ADDTOGROUP_INCREASE",
            DiffKind::DocTagAddtogroupDecrease => "DOC_TAG_ADDTOGROUP_DECREASE",
            DiffKind::DocTagFileIncrease => "DOC_TAG_FILE_INCREASE",
            DiffKind::DocTagFileDecrease => "DOC_TAG_FILE_DECREASE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DiffKind::AddApi => "API added",
            DiffKind::ReduceApi => "API removed",
            DiffKind::AddDoc => "doc comment added",
            DiffKind::ReduceDoc => "doc comment removed",
            DiffKind::FunctionReturnChange => "function return type changed",
            DiffKind::FunctionParamNameChange => "function parameter name changed",
            DiffKind::FunctionParamTypeChange => "function parameter type changed",
            DiffKind::FunctionParamAdd => "function parameter added",
            DiffKind::FunctionParamReduce => "function parameter removed",
            DiffKind::FunctionParamPosChange => "function parameter position changed",
            DiffKind::DefineNameChange => "macro name changed",
            DiffKind::DefineTextChange => "macro text changed",
            DiffKind::StructNameChange => "struct name changed",
            DiffKind::StructMemberNameChange => "struct member name changed",
            DiffKind::StructMemberTypeChange => "struct member type changed",
            DiffKind::StructMemberAdd => "struct member added",
            DiffKind::StructMemberReduce => "struct member removed",
            DiffKind::UnionNameChange => "union name changed",
            DiffKind::UnionMemberNameChange => "union member name changed",
            DiffKind::UnionMemberTypeChange => "union member type changed",
            DiffKind::UnionMemberAdd => "union member added",
            DiffKind::UnionMemberReduce => "union member removed",
            DiffKind::EnumNameChange => "enum name changed",
            DiffKind::EnumMemberNameChange => "enum member name changed",
            DiffKind::EnumMemberValueChange => "enum member value changed",
            DiffKind::EnumMemberAdd => "enum member added",
            DiffKind::EnumMemberReduce => "enum member removed",
            DiffKind::VariableNameChange => "variable name changed",
            DiffKind::VariableTypeChange => "variable type changed",
            DiffKind::VariableValueChange => "variable value changed",
            DiffKind::VariableChangeToConstant => "variable changed to constant",
            DiffKind::ConstantNameChange => "constant name changed",
            DiffKind::ConstantTypeChange => "constant type changed",
            DiffKind::ConstantValueChange => "constant value changed",
            DiffKind::ConstantChangeToVariable => "constant changed to variable",
            DiffKind::TypedefNameTypeChange => "typedef name or type changed",
            DiffKind::DocTagAddtogroupNaToHave => "@addtogroup tag added",
            DiffKind::DocTagAddtogroupHaveToNa => "@addtogroup tag removed",
            DiffKind::DocTagAddtogroupAToB => "@addtogroup tag changed",
            DiffKind::DocTagBriefNaToHave => "@brief tag added",
            DiffKind::DocTagBriefHaveToNa => "@brief tag removed",
            DiffKind::DocTagBriefAToB => "@brief tag changed",
            DiffKind::DocTagDeprecatedNaToHave => "@deprecated tag added",
            DiffKind::DocTagDeprecatedHaveToNa => "@deprecated tag removed",
            DiffKind::DocTagDeprecatedAToB => "@deprecated tag changed",
            DiffKind::DocTagFileNaToHave => "@file tag added",
            DiffKind::DocTagFileHaveToNa => "@file tag removed",
            DiffKind::DocTagFileAToB => "@file tag changed",
            DiffKind::DocTagLibraryNaToHave => "@library tag added",
            DiffKind::DocTagLibraryHaveToNa => "@library tag removed",
            DiffKind::DocTagLibraryAToB => "@library tag changed",
            DiffKind::DocTagParamNaToHave => "@param tag added",
            DiffKind::DocTagParamHaveToNa => "@param tag removed",
            DiffKind::DocTagParamNameAToB => "@param tag name changed",
            DiffKind::DocTagParamAToB => "@param tag description changed",
            DiffKind::DocTagParamCountMismatch => "@param tag count does not match parameters",
            DiffKind::DocTagPermissionNaToHave => "@permission tag added",
            DiffKind::DocTagPermissionHaveToNa => "@permission tag removed",
            DiffKind::DocTagPermissionRangeBigger => "@permission range widened",
            DiffKind::DocTagPermissionRangeSmaller => "@permission range narrowed",
            DiffKind::DocTagPermissionRangeChange => "@permission changed",
            DiffKind::DocTagSinceNaToHave => "@since tag added",
            DiffKind::DocTagSinceHaveToNa => "@since tag removed",
            DiffKind::DocTagSinceAToB => "@since tag changed",
            DiffKind::DocTagSyscapNaToHave => "@syscap tag added",
            DiffKind::DocTagSyscapHaveToNa => "@syscap tag removed",
            DiffKind::DocTagSyscapAToB => "@syscap tag changed",
            DiffKind::DocTagLeftBraceNaToHave => "@{ tag added",
            DiffKind::DocTagLeftBraceHaveToNa => "@{ tag removed",
            DiffKind::DocTagRightBraceNaToHave => "@} tag added",
            DiffKind::DocTagRightBraceHaveToNa => "@} tag removed",
            DiffKind::DocTagAddtogroupIncrease => "@addtogroup tag count increased",
            DiffKind::DocTagAddtogroupDecrease => "@addtogroup tag count decreased",
            DiffKind::DocTagFileIncrease => "@file tag count increased",
            DiffKind::DocTagFileDecrease => "@file tag count decreased",
        }
    }
}

/// Coarse bucket of a change, independent of its compatibility verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    ApiAdded,
    ApiRemoved,
    NonApiDocChange,
    PrototypeChange,
    ConstraintChange,
}

impl ChangeCategory {
    pub const ALL: [ChangeCategory; 5] = [
        ChangeCategory::ApiAdded,
        ChangeCategory::ApiRemoved,
        ChangeCategory::NonApiDocChange,
        ChangeCategory::PrototypeChange,
        ChangeCategory::ConstraintChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::ApiAdded => "api_added",
            ChangeCategory::ApiRemoved => "api_removed",
            ChangeCategory::NonApiDocChange => "non_api_doc_change",
            ChangeCategory::PrototypeChange => "prototype_change",
            ChangeCategory::ConstraintChange => "constraint_change",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChangeCategory::ApiAdded => "API added",
            ChangeCategory::ApiRemoved => "API removed",
            ChangeCategory::NonApiDocChange => "non-API doc change",
            ChangeCategory::PrototypeChange => "prototype change",
            ChangeCategory::ConstraintChange => "constraint change",
        }
    }
}

/// Report text combining class, declaration and differing fragment.
pub fn full_text(class_name: &str, declaration: &str, content: &str) -> String {
    format!(
        "class:{};\ndeclaration:{};\ndiff:{}\n",
        class_name, declaration, content
    )
}

/// A single difference between the old and new version of a declaration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiffRecord {
    pub kind: DiffKind,

    /// Old fragment, `NA` when absent
    pub old_value: String,

    /// New fragment, `NA` when absent
    pub new_value: String,

    pub is_compatible: bool,
    pub category: ChangeCategory,

    /// Location of the old node when both sides exist
    pub location: Location,

    pub api_name: String,
    pub api_kind: Option<NodeKind>,
    pub class_name: String,
    pub unique_id: String,
    pub kit_name: String,
    pub sub_system: String,
    pub is_system_api: bool,

    /// Set when the owning declaration is `extern`
    pub is_api_change: bool,
    pub api_source: ApiSource,

    /// Top-level declaration this record belongs to
    pub owner_name: String,
    pub owner_unique_id: String,
    pub owner_kind: Option<NodeKind>,

    pub old_declaration: String,
    pub new_declaration: String,
    pub old_full_text: String,
    pub new_full_text: String,

    /// Line of the doc tag for tag-level records
    pub doc_line: Option<u32>,
}

impl DiffRecord {
    /// Create a classified record with no node metadata.
    pub fn create(kind: DiffKind, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        let (is_compatible, category) = classify(kind);
        Self {
            kind,
            old_value: old_value.into(),
            new_value: new_value.into(),
            is_compatible,
            category,
            location: Location::default(),
            api_name: String::new(),
            api_kind: None,
            class_name: String::new(),
            unique_id: String::new(),
            kit_name: String::new(),
            sub_system: String::new(),
            is_system_api: false,
            is_api_change: false,
            api_source: ApiSource::NotApplicable,
            owner_name: String::new(),
            owner_unique_id: String::new(),
            owner_kind: None,
            old_declaration: String::new(),
            new_declaration: String::new(),
            old_full_text: String::new(),
            new_full_text: String::new(),
            doc_line: None,
        }
    }

    /// Copy identity metadata from the nodes the record describes.
    pub fn with_nodes(mut self, old: Option<&Node>, new: Option<&Node>) -> Self {
        if let Some(node) = old.or(new) {
            self.location = node.location.clone();
            self.api_name = node.name.clone();
            self.api_kind = Some(node.kind);
            self.class_name = node.class_name.clone();
            self.unique_id = node.unique_id.clone();
            self.kit_name = node.kit_name.clone();
            self.sub_system = node.sub_system.clone();
            self.is_system_api = node.is_system_api;
        }
        if let Some(node) = old {
            self.old_declaration = node.declaration().to_string();
            self.old_full_text = full_text(&node.class_name, node.declaration(), &self.old_value);
        }
        if let Some(node) = new {
            self.new_declaration = node.declaration().to_string();
            self.new_full_text = full_text(&node.class_name, node.declaration(), &self.new_value);
        }
        self
    }

    /// Point the record at a doc tag line and use the tag lines as snippets.
    pub fn with_tag_source(mut self, line: u32, old: Option<&str>, new: Option<&str>) -> Self {
        self.doc_line = Some(line);
        if let Some(text) = old {
            self.old_declaration = text.to_string();
        }
        if let Some(text) = new {
            self.new_declaration = text.to_string();
        }
        self
    }

    /// Attach the owning top-level declaration.
    pub fn with_owner(mut self, owner: &Node) -> Self {
        self.set_owner(owner);
        self
    }

    pub fn set_owner(&mut self, owner: &Node) {
        self.owner_name = owner.display_name().to_string();
        self.owner_unique_id = owner.unique_id.clone();
        self.owner_kind = Some(owner.kind);
        self.api_source = owner.api_source;
        self.is_api_change = owner.is_extern;
    }

    /// Line reported for this record.
    pub fn line(&self) -> u32 {
        self.doc_line.unwrap_or(self.location.line)
    }

    pub fn path(&self) -> &str {
        &self.location.path
    }
}

/// Status of a header file between the two trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Added => "added",
            FileStatus::Removed => "removed",
            FileStatus::Modified => "modified",
        }
    }
}

/// A header that was added, removed or changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    pub old_hash: Option<String>,
    pub new_hash: Option<String>,
}

/// Summary statistics for a diff.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    pub total: u32,
    pub compatible: u32,
    pub incompatible: u32,

    pub api_added: u32,
    pub api_removed: u32,
    pub doc_changes: u32,
    pub prototype_changes: u32,
    pub constraint_changes: u32,

    pub files_added: u32,
    pub files_removed: u32,
    pub files_modified: u32,

    pub syntax_errors: u32,
}

impl DiffSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment counters for one record.
    pub fn record(&mut self, record: &DiffRecord) {
        self.total += 1;
        if record.is_compatible {
            self.compatible += 1;
        } else {
            self.incompatible += 1;
        }
        match record.category {
            ChangeCategory::ApiAdded => self.api_added += 1,
            ChangeCategory::ApiRemoved => self.api_removed += 1,
            ChangeCategory::NonApiDocChange => self.doc_changes += 1,
            ChangeCategory::PrototypeChange => self.prototype_changes += 1,
            ChangeCategory::ConstraintChange => self.constraint_changes += 1,
        }
    }

    pub fn record_file(&mut self, status: FileStatus) {
        match status {
            FileStatus::Added => self.files_added += 1,
            FileStatus::Removed => self.files_removed += 1,
            FileStatus::Modified => self.files_modified += 1,
        }
    }

    /// Generate human-readable summary string.
    pub fn text(&self) -> String {
        if self.total == 0 {
            return "No changes".to_string();
        }

        let mut parts = vec![format!(
            "{} changes ({} incompatible)",
            self.total, self.incompatible
        )];

        let buckets = [
            (self.api_added, "added"),
            (self.api_removed, "removed"),
            (self.prototype_changes, "prototype"),
            (self.constraint_changes, "constraint"),
            (self.doc_changes, "doc"),
        ];
        let detail: Vec<String> = buckets
            .iter()
            .filter(|(count, _)| *count > 0)
            .map(|(count, name)| format!("{} {}", count, name))
            .collect();
        if !detail.is_empty() {
            parts.push(detail.join(", "));
        }

        let files = self.files_added + self.files_removed + self.files_modified;
        if files > 0 {
            parts.push(format!("{} files", files));
        }

        parts.join("; ")
    }
}

/// Complete result of diffing two header trees.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiffResult {
    /// All records in traversal order
    pub records: Vec<DiffRecord>,

    /// Syntax problems reported by the AST provider
    pub syntax_errors: Vec<SyntaxError>,

    /// Headers that differ between the trees
    pub files: Vec<FileChange>,

    /// Summary statistics
    pub summary: DiffSummary,

    /// Human-readable summary text
    pub summary_text: String,

    /// Duration of diff operation in milliseconds
    pub duration_ms: f64,
}

impl DiffResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record and update summary.
    pub fn add_record(&mut self, record: DiffRecord) {
        self.summary.record(&record);
        self.records.push(record);
    }

    pub fn add_file(&mut self, file: FileChange) {
        self.summary.record_file(file.status);
        self.files.push(file);
    }

    pub fn add_syntax_error(&mut self, error: SyntaxError) {
        self.summary.syntax_errors += 1;
        self.syntax_errors.push(error);
    }

    /// Finalize the result with timing and summary text.
    pub fn finalize(&mut self, duration_ms: f64) {
        self.duration_ms = duration_ms;
        self.summary_text = self.summary.text();
    }

    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.records.is_empty()
    }

    /// Check if any change breaks compatibility.
    pub fn has_incompatible_changes(&self) -> bool {
        self.records.iter().any(|r| !r.is_compatible)
    }

    /// Get change count.
    pub fn change_count(&self) -> usize {
        self.records.len()
    }

    pub fn incompatible(&self) -> Vec<&DiffRecord> {
        self.records.iter().filter(|r| !r.is_compatible).collect()
    }

    /// Filter records by category.
    pub fn filter_category(&self, category: ChangeCategory) -> Vec<&DiffRecord> {
        self.records.iter().filter(|r| r.category == category).collect()
    }

    /// Filter records by file path.
    pub fn filter_by_path(&self, file_path: &str) -> Vec<&DiffRecord> {
        self.records
            .iter()
            .filter(|r| r.location.path == file_path)
            .collect()
    }
}
