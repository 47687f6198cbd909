//! Compatibility classification.
//!
//! [`classify`] maps every [`DiffKind`] to its compatibility verdict and
//! change category. The match is exhaustive, so a new kind does not compile
//! until it is classified. A narrower table of violation rules drives
//! compatibility checking.

use serde::{Deserialize, Serialize};

use crate::differ::changes::{ChangeCategory, DiffKind, DiffRecord};

/// Verdict and category for a change kind.
pub fn classify(kind: DiffKind) -> (bool, ChangeCategory) {
    use ChangeCategory::*;
    use DiffKind::*;

    match kind {
        AddApi => (true, ApiAdded),
        ReduceApi => (false, ApiRemoved),

        AddDoc => (true, NonApiDocChange),
        ReduceDoc => (false, NonApiDocChange),
        DocTagParamCountMismatch => (true, NonApiDocChange),

        FunctionParamNameChange | EnumMemberAdd => (true, PrototypeChange),
        FunctionReturnChange
        | FunctionParamTypeChange
        | FunctionParamAdd
        | FunctionParamReduce
        | FunctionParamPosChange
        | DefineNameChange
        | DefineTextChange
        | StructNameChange
        | StructMemberNameChange
        | StructMemberTypeChange
        | StructMemberAdd
        | StructMemberReduce
        | UnionNameChange
        | UnionMemberNameChange
        | UnionMemberTypeChange
        | UnionMemberAdd
        | UnionMemberReduce
        | EnumNameChange
        | EnumMemberNameChange
        | EnumMemberValueChange
        | EnumMemberReduce
        | VariableNameChange
        | VariableTypeChange
        | VariableValueChange
        | VariableChangeToConstant
        | ConstantNameChange
        | ConstantTypeChange
        | ConstantValueChange
        | ConstantChangeToVariable
        | TypedefNameTypeChange => (false, PrototypeChange),

        DocTagAddtogroupNaToHave
        | DocTagAddtogroupHaveToNa
        | DocTagAddtogroupAToB
        | DocTagBriefNaToHave
        | DocTagBriefHaveToNa
        | DocTagBriefAToB
        | DocTagDeprecatedNaToHave
        | DocTagDeprecatedHaveToNa
        | DocTagDeprecatedAToB
        | DocTagFileNaToHave
        | DocTagFileHaveToNa
        | DocTagFileAToB
        | DocTagParamAToB
        | DocTagPermissionHaveToNa
        | DocTagPermissionRangeBigger
        | DocTagSinceNaToHave
        | DocTagSinceAToB
        | DocTagLeftBraceNaToHave
        | DocTagLeftBraceHaveToNa
        | DocTagRightBraceNaToHave
        | DocTagRightBraceHaveToNa
        | DocTagAddtogroupIncrease
        | DocTagAddtogroupDecrease
        | DocTagFileIncrease
        | DocTagFileDecrease => (true, ConstraintChange),

        DocTagLibraryNaToHave
        | DocTagLibraryHaveToNa
        | DocTagLibraryAToB
        | DocTagParamNaToHave
        | DocTagParamHaveToNa
        | DocTagParamNameAToB
        | DocTagPermissionNaToHave
        | DocTagPermissionRangeSmaller
        | DocTagPermissionRangeChange
        | DocTagSinceHaveToNa
        | DocTagSyscapNaToHave
        | DocTagSyscapHaveToNa
        | DocTagSyscapAToB => (false, ConstraintChange),
    }
}

pub fn is_compatible(kind: DiffKind) -> bool {
    classify(kind).0
}

pub fn category(kind: DiffKind) -> ChangeCategory {
    classify(kind).1
}

/// A compatibility rule; `$$` in the template is the old text, `&&` the new.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: &'static str,
    pub kind: DiffKind,
    pub template: &'static str,
}

const MESSAGE_PREFIX: &str = "API check error of [api compatibility errors]:";
const MESSAGE_SUFFIX: &str = "Please resolve it.";

impl Rule {
    /// Full violation message for one record.
    pub fn message(&self, old: &str, new: &str) -> String {
        let detail = self.template.replace("$$", old).replace("&&", new);
        format!("{}{}{}", MESSAGE_PREFIX, detail, MESSAGE_SUFFIX)
    }
}

const fn rule(id: &'static str, kind: DiffKind, template: &'static str) -> Rule {
    Rule { id, kind, template }
}

pub static RULES: &[Rule] = &[
    rule("API_CHANGE_INCOMPATIBLE_01", DiffKind::ReduceApi, "Deleting [$$] API is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_06", DiffKind::FunctionReturnChange, "Changing function return type [$$] to function return type [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_07", DiffKind::FunctionParamPosChange, "Changing function param location [$$] to function param location [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_08", DiffKind::FunctionParamAdd, "Adding new function param [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_09", DiffKind::FunctionParamReduce, "Deleting function param [$$] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_10", DiffKind::FunctionParamTypeChange, "Changing function param type [$$] to function param type [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_11", DiffKind::VariableNameChange, "Changing variable name [$$] to variable name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_12", DiffKind::ConstantNameChange, "Changing const name [$$] to const name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_13", DiffKind::VariableTypeChange, "Changing variable type [$$] to variable type [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_14", DiffKind::ConstantTypeChange, "Changing const type [$$] to const type [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_15", DiffKind::VariableChangeToConstant, "Changing variable [$$] to const [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_16", DiffKind::ConstantChangeToVariable, "Changing const [$$] to variable [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_17", DiffKind::VariableValueChange, "Changing variable value [$$] to variable value [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_18", DiffKind::ConstantValueChange, "Changing const value [$$] to const value [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_21", DiffKind::DefineNameChange, "Changing macro name [$$] to macro name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_22", DiffKind::DefineTextChange, "Changing macro value [$$] to macro value [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_24", DiffKind::EnumNameChange, "Changing enum name [$$] to enum name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_25", DiffKind::EnumMemberNameChange, "Changing enum member name [$$] to enum member name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_26", DiffKind::EnumMemberValueChange, "Changing enum member value [$$] to enum member name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_28", DiffKind::EnumMemberReduce, "Deleting enum member [$$] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_29", DiffKind::StructNameChange, "Changing struct name [$$] to struct name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_30", DiffKind::StructMemberAdd, "Adding struct member [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_31", DiffKind::StructMemberReduce, "Deleting struct member [$$] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_32", DiffKind::StructMemberTypeChange, "Changing struct member type [$$] to struct member type [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_33", DiffKind::StructMemberNameChange, "Changing struct member name [$$] to struct member name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_36", DiffKind::UnionNameChange, "Changing union name [$$] to union name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_37", DiffKind::UnionMemberAdd, "Adding union member [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_38", DiffKind::UnionMemberReduce, "Deleting union member [$$] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_39", DiffKind::UnionMemberTypeChange, "Changing union member type [$$] to union member type [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_40", DiffKind::UnionMemberNameChange, "Changing union member name [$$] to union member name [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_43", DiffKind::DocTagLibraryNaToHave, "Changing the @library in comments from no to [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_44", DiffKind::DocTagLibraryHaveToNa, "Changing the @library in comments from [$$] to no is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_45", DiffKind::DocTagLibraryAToB, "Changing the @library in comments from [$$] to [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_47", DiffKind::DocTagPermissionRangeSmaller, "Changing the @permission in comments is prohibited.Reduce or relation permission."),
    rule("API_CHANGE_INCOMPATIBLE_48", DiffKind::DocTagPermissionRangeChange, "Changing the @permission in comments is prohibited.Permission value change."),
    rule("API_CHANGE_INCOMPATIBLE_49", DiffKind::DocTagSyscapNaToHave, "Changing the @syscap in comments from no to [&&] is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_50", DiffKind::DocTagSyscapHaveToNa, "Changing the @syscap in comments from [$$] to no is prohibited."),
    rule("API_CHANGE_INCOMPATIBLE_51", DiffKind::DocTagSyscapAToB, "Changing the @syscap in comments from [$$] to [&&] is prohibited."),
];

/// Violation rule for a change kind, if the kind is checked.
pub fn rule_for(kind: DiffKind) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.kind == kind)
}

pub fn rule_by_id(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}

/// A compatibility violation found in a diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub file_path: String,
    pub line: u32,
    pub rule_id: String,
    pub message: String,
    pub code_snippet: String,
}

/// Match incompatible records against the enabled rules.
///
/// `enabled` limits checking to the given rule ids; `None` enables all.
pub fn check_compatibility<'a>(
    records: impl IntoIterator<Item = &'a DiffRecord>,
    enabled: Option<&[String]>,
) -> Vec<Finding> {
    records
        .into_iter()
        .filter(|record| !record.is_compatible)
        .filter_map(|record| {
            let rule = rule_for(record.kind)?;
            if let Some(ids) = enabled {
                if !ids.iter().any(|id| id == rule.id) {
                    return None;
                }
            }
            Some(Finding {
                file_path: record.location.path.clone(),
                line: record.line(),
                rule_id: rule.id.to_string(),
                message: rule.message(&record.old_value, &record.new_value),
                code_snippet: format!(
                    "Old since:{}\nNew since:{}",
                    record.old_declaration, record.new_declaration
                ),
            })
        })
        .collect()
}
