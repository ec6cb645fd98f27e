//! Works out which fields a change to one field invalidates.
//!
//! A budget belongs to one user and one week, so it only stays on a row while
//! the row's account has the same owner and the row's date falls in the same
//! week. Categories carry denormalised display names that follow the
//! category.

use crate::{budget::BudgetId, date_range::week_of};

use super::{
    reference::ReferenceData,
    row::{Field, FieldChange, FieldSet, Row},
};

/// Whether `budget_id` is a candidate for `row`: the budget is loaded for the
/// week of the row's date and owned by the owner of the row's account.
pub fn budget_is_valid(row: &Row, budget_id: BudgetId, reference: &ReferenceData) -> bool {
    let (Some(date), Some(account_id)) = (row.date, row.account) else {
        return false;
    };

    let Some(owner) = reference.account_owner(account_id) else {
        return false;
    };

    reference
        .budgets_for_week(week_of(date))
        .iter()
        .any(|budget| budget.id == budget_id && budget.owner == owner)
}

/// The fields that must be cleared when `change` is applied to `row`.
pub fn dependent_resets(row: &Row, change: &FieldChange, reference: &ReferenceData) -> FieldSet {
    let mut resets = FieldSet::new();

    match *change {
        FieldChange::Date(new_date) => {
            let same_week = match (row.date, new_date) {
                (Some(old), Some(new)) => week_of(old) == week_of(new),
                // A missing date has no week.
                _ => false,
            };

            if row.budget.is_some() && !same_week {
                resets.insert(Field::Budget);
            }
        }
        FieldChange::Account(new_account) => {
            if let Some(budget_id) = row.budget {
                let candidate = Row {
                    account: new_account,
                    ..row.clone()
                };

                if !budget_is_valid(&candidate, budget_id, reference) {
                    resets.insert(Field::Budget);
                }
            }
        }
        FieldChange::Budget(Some(budget_id)) => {
            if !budget_is_valid(row, budget_id, reference) {
                resets.insert(Field::Budget);
            }
        }
        FieldChange::Category(Some(category_id)) => {
            let categories = reference.categories();
            let is_assignable =
                categories.get(category_id).is_some() && categories.is_leaf(category_id);

            if !is_assignable {
                resets.insert(Field::Category);
            }
        }
        FieldChange::Budget(None) | FieldChange::Category(None) | FieldChange::Amount(_) => {}
    }

    resets
}

/// Apply `change` to a copy of `row`, clear the fields it invalidates and
/// refresh the category names.
pub fn apply_change(row: &Row, change: FieldChange, reference: &ReferenceData) -> Row {
    let resets = dependent_resets(row, &change, reference);

    let mut updated = row.clone();
    updated.set(change);

    for field in resets {
        updated.clear(field);
    }

    updated.refresh_category_names(reference.categories());

    updated
}
