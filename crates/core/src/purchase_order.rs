//! Multi-category purchase order fan-out.
//!
//! One submission names a set of categories; each category becomes its own
//! purchase-order row sharing the PO number, project, supplier, value, date
//! and status.

use crate::error::CoreError;
use crate::types::DbId;

/// Collapse the submitted category ids into the ordered set of rows to create.
///
/// Duplicate ids keep their first position. An empty set is rejected.
pub fn distinct_categories(category_ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
    let mut out: Vec<DbId> = Vec::with_capacity(category_ids.len());
    for &id in category_ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    if out.is_empty() {
        return Err(CoreError::field(
            "category_ids",
            "At least one category must be selected.",
        ));
    }
    Ok(out)
}

/// How an edit of an existing PO row applies a category set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutUpdate {
    /// Category written onto the edited row.
    pub in_place: DbId,
    /// Categories that each get a freshly inserted row.
    pub additional: Vec<DbId>,
}

/// Plan an edit: the first category updates the row in place, the rest are
/// inserted as new rows.
///
/// Sibling rows whose category was dropped from the set are left untouched;
/// see [`stale_categories`].
pub fn plan_update(category_ids: &[DbId]) -> Result<FanOutUpdate, CoreError> {
    let mut categories = distinct_categories(category_ids)?;
    let in_place = categories.remove(0);
    Ok(FanOutUpdate {
        in_place,
        additional: categories,
    })
}

/// Categories of existing sibling rows that are no longer in the submitted set.
///
/// An edit does not delete these rows; callers report them.
pub fn stale_categories(existing: &[DbId], submitted: &[DbId]) -> Vec<DbId> {
    let mut stale: Vec<DbId> = existing
        .iter()
        .copied()
        .filter(|id| !submitted.contains(id))
        .collect();
    stale.sort_unstable();
    stale.dedup();
    stale
}

pub fn created_message(rows: usize) -> String {
    format!("Successfully created {rows} PPO record(s) for the selected categories")
}

pub fn updated_message(additional: usize) -> String {
    let mut message = String::from("PPO has been updated successfully");
    if additional > 0 {
        message.push_str(&format!(
            " and {additional} additional record(s) created for other categories"
        ));
    }
    message
}
