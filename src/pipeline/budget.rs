//! Per-key character budgets.
//!
//! The template's layout was designed around its original text: a headline
//! box fits a headline of roughly the original length, not a paragraph.
//! Budgets bound the generated copy so the fixed-dimension layout survives
//! substitution. Each budget is the original length plus 20 % headroom,
//! floored at [`MIN_BUDGET`] so very short originals ("Hi!") still leave the
//! model room to write something usable. Slots with no recorded original
//! fall back to a per-type default.

use crate::pipeline::extract::PlaceholderMap;
use indexmap::IndexMap;
use tracing::debug;

/// Smallest budget ever issued, regardless of original length.
pub const MIN_BUDGET: usize = 50;

/// Headroom multiplier over the original text length.
pub const BUDGET_HEADROOM: f64 = 1.2;

/// Key → maximum character count, in the same order as the placeholder map.
pub type BudgetMap = IndexMap<String, usize>;

/// Budget for one slot given its recorded original length.
pub fn budget_for(original_len: Option<usize>, default: usize) -> usize {
    match original_len {
        Some(len) => MIN_BUDGET.max((len as f64 * BUDGET_HEADROOM).ceil() as usize),
        None => default,
    }
}

/// Compute a budget for every placeholder key. No key is dropped or added.
pub fn compute_budgets(placeholders: &PlaceholderMap) -> BudgetMap {
    let budgets: BudgetMap = placeholders
        .iter()
        .map(|(key, record)| {
            let budget = budget_for(record.original_len, record.slot.default_budget());
            (key.clone(), budget)
        })
        .collect();

    debug!(keys = budgets.len(), "computed budgets");
    budgets
}
