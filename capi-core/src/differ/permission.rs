//! Permission expression range comparison.
//!
//! `@permission` tags hold expressions such as
//! `ohos.permission.A and ohos.permission.B or ohos.permission.C`.
//! A [`PermissionPolicy`] decides whether the new expression accepts more
//! callers, fewer callers, or an unrelated set.

use std::collections::BTreeSet;

/// How the set of callers satisfying an expression moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeChange {
    Same,
    /// Every caller allowed before is still allowed.
    Bigger,
    /// Every caller allowed now was allowed before.
    Smaller,
    Changed,
}

pub trait PermissionPolicy: Send + Sync {
    fn compare(&self, old: &str, new: &str) -> RangeChange;
}

/// Treats expressions as an OR of AND-clauses over permission names.
///
/// Parentheses are ignored and `&&`/`||` are accepted as operators.
#[derive(Clone, Copy, Debug, Default)]
pub struct DnfPermissionPolicy;

type Clause = BTreeSet<String>;

fn clauses(expression: &str) -> Vec<Clause> {
    let cleaned = expression.replace(&['(', ')'][..], " ");
    let mut result = Vec::new();
    let mut current = Clause::new();
    for token in cleaned.split_whitespace() {
        match token.to_ascii_lowercase().as_str() {
            "or" | "||" => {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
            }
            "and" | "&&" => {}
            _ => {
                current.insert(token.to_string());
            }
        }
    }
    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// `lhs` implies `rhs`: any caller satisfying a clause of `lhs` satisfies
/// some clause of `rhs`.
fn implies(lhs: &[Clause], rhs: &[Clause]) -> bool {
    lhs.iter()
        .all(|clause| rhs.iter().any(|other| other.is_subset(clause)))
}

impl PermissionPolicy for DnfPermissionPolicy {
    fn compare(&self, old: &str, new: &str) -> RangeChange {
        let old = clauses(old);
        let new = clauses(new);
        match (implies(&old, &new), implies(&new, &old)) {
            (true, true) => RangeChange::Same,
            (true, false) => RangeChange::Bigger,
            (false, true) => RangeChange::Smaller,
            (false, false) => RangeChange::Changed,
        }
    }
}
