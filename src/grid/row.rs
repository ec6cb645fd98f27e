//! The row model: one transaction as it is being viewed or edited in the grid.

use std::{collections::BTreeSet, fmt::Display};

use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::AccountId,
    budget::BudgetId,
    category::{CategoryId, CategoryTree},
    date_range::parse_date,
    transaction::{Transaction, TransactionDraft, TransactionId},
};

/// Identifies a row for the lifetime of an edit session.
///
/// Unlike [TransactionId], a row ID exists before the row is first saved and
/// is never sent to the persistence API.
pub type RowId = u64;

/// The editable fields of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Amount,
    Account,
    Budget,
    Category,
}

/// A set of fields, in column order.
pub type FieldSet = BTreeSet<Field>;

impl Field {
    /// Every field, in column order.
    pub const ALL: [Field; 5] = [
        Field::Date,
        Field::Amount,
        Field::Account,
        Field::Budget,
        Field::Category,
    ];

    /// The column heading.
    pub fn label(self) -> &'static str {
        match self {
            Field::Date => "Date",
            Field::Amount => "Amount",
            Field::Account => "Account",
            Field::Budget => "Budget",
            Field::Category => "Category",
        }
    }

    /// The name used for the field in forms and query strings.
    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Account => "account",
            Field::Budget => "budget",
            Field::Category => "category",
        }
    }

    /// Whether a row must have a value for the field before it can be saved.
    pub fn is_required(self) -> bool {
        !matches!(self, Field::Budget)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One transaction in the grid, possibly unsaved and possibly incomplete.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: RowId,
    /// The persisted transaction, `None` until the row is first saved.
    pub transaction_id: Option<TransactionId>,
    pub date: Option<Date>,
    /// Expenses are negative and income is positive.
    pub amount: Option<f64>,
    pub account: Option<AccountId>,
    pub budget: Option<BudgetId>,
    pub category: Option<CategoryId>,
    pub category_name: String,
    /// Empty when the category has no parent.
    pub category_parent_name: String,
}

impl Row {
    /// A blank draft, dated `date`.
    pub fn empty(id: RowId, date: Option<Date>) -> Self {
        Self {
            id,
            transaction_id: None,
            date,
            amount: None,
            account: None,
            budget: None,
            category: None,
            category_name: String::new(),
            category_parent_name: String::new(),
        }
    }

    pub fn from_transaction(id: RowId, transaction: &Transaction, categories: &CategoryTree) -> Self {
        let mut row = Self {
            id,
            transaction_id: Some(transaction.id),
            date: Some(transaction.date),
            amount: Some(transaction.amount),
            account: Some(transaction.account_id),
            budget: transaction.budget_id,
            category: Some(transaction.category_id),
            category_name: String::new(),
            category_parent_name: String::new(),
        };
        row.refresh_category_names(categories);

        row
    }

    /// Set the field named by `change` to its new value, without touching
    /// any other field.
    pub fn set(&mut self, change: FieldChange) {
        match change {
            FieldChange::Date(date) => self.date = date,
            FieldChange::Amount(amount) => self.amount = amount,
            FieldChange::Account(account) => self.account = account,
            FieldChange::Budget(budget) => self.budget = budget,
            FieldChange::Category(category) => self.category = category,
        }
    }

    /// Whether the row already has the value in `change`.
    ///
    /// Amounts are compared without their sign, as the grid shows them.
    pub fn holds(&self, change: FieldChange) -> bool {
        match change {
            FieldChange::Date(date) => self.date == date,
            FieldChange::Amount(amount) => self.amount.map(f64::abs) == amount.map(f64::abs),
            FieldChange::Account(account) => self.account == account,
            FieldChange::Budget(budget) => self.budget == budget,
            FieldChange::Category(category) => self.category == category,
        }
    }

    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Date => self.date = None,
            Field::Amount => self.amount = None,
            Field::Account => self.account = None,
            Field::Budget => self.budget = None,
            Field::Category => {
                self.category = None;
                self.category_name.clear();
                self.category_parent_name.clear();
            }
        }
    }

    /// Recompute the category's display names from the hierarchy.
    ///
    /// Both names are cleared if the category is unset or unknown.
    pub fn refresh_category_names(&mut self, categories: &CategoryTree) {
        match self.category.and_then(|id| categories.get(id)) {
            Some(category) => {
                self.category_name = category.name.clone();
                self.category_parent_name = categories.parent_name(category);
            }
            None => {
                self.category_name.clear();
                self.category_parent_name.clear();
            }
        }
    }

    /// The category as shown in the grid, e.g. "Food / Groceries".
    pub fn category_label(&self) -> String {
        if self.category_parent_name.is_empty() {
            self.category_name.clone()
        } else {
            format!("{} / {}", self.category_parent_name, self.category_name)
        }
    }

    /// Build the upsert payload for the row.
    ///
    /// The amount's sign is set from the category's kind. Returns `None` if a
    /// required field is missing or the category is not in `categories`.
    pub fn to_draft(&self, categories: &CategoryTree) -> Option<TransactionDraft> {
        let category = categories.get(self.category?)?;

        Some(TransactionDraft {
            id: self.transaction_id,
            date: self.date?,
            amount: category.kind.signed_amount(self.amount?),
            account_id: self.account?,
            budget_id: self.budget,
            category_id: category.id,
        })
    }
}

/// A new value for one field of a row. `None` clears the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldChange {
    Date(Option<Date>),
    Amount(Option<f64>),
    Account(Option<AccountId>),
    Budget(Option<BudgetId>),
    Category(Option<CategoryId>),
}

impl FieldChange {
    pub fn field(&self) -> Field {
        match self {
            FieldChange::Date(_) => Field::Date,
            FieldChange::Amount(_) => Field::Amount,
            FieldChange::Account(_) => Field::Account,
            FieldChange::Budget(_) => Field::Budget,
            FieldChange::Category(_) => Field::Category,
        }
    }

    /// Parse the text submitted by a grid cell.
    ///
    /// Blank text clears the field. Amounts may contain thousands separators.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidFieldValue] if `value` cannot be parsed for `field`.
    pub fn parse(field: Field, value: &str) -> Result<Self, Error> {
        let trimmed = value.trim();
        let invalid = || Error::InvalidFieldValue {
            field,
            value: value.to_owned(),
        };

        if trimmed.is_empty() {
            return Ok(Self::cleared(field));
        }

        let change = match field {
            Field::Date => FieldChange::Date(Some(parse_date(trimmed).map_err(|_| invalid())?)),
            Field::Amount => {
                let amount = trimmed
                    .replace(',', "")
                    .parse::<f64>()
                    .map_err(|_| invalid())?;

                if !amount.is_finite() {
                    return Err(invalid());
                }

                FieldChange::Amount(Some(amount))
            }
            Field::Account => FieldChange::Account(Some(parse_id(trimmed).ok_or_else(invalid)?)),
            Field::Budget => FieldChange::Budget(Some(parse_id(trimmed).ok_or_else(invalid)?)),
            Field::Category => FieldChange::Category(Some(parse_id(trimmed).ok_or_else(invalid)?)),
        };

        Ok(change)
    }

    fn cleared(field: Field) -> Self {
        match field {
            Field::Date => FieldChange::Date(None),
            Field::Amount => FieldChange::Amount(None),
            Field::Account => FieldChange::Account(None),
            Field::Budget => FieldChange::Budget(None),
            Field::Category => FieldChange::Category(None),
        }
    }
}

fn parse_id(text: &str) -> Option<i64> {
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        Error,
        category::{Category, CategoryKind, CategoryTree},
        transaction::Transaction,
    };

    use super::{Field, FieldChange, Row};

    fn categories() -> CategoryTree {
        CategoryTree::new(vec![
            Category {
                id: 1,
                name: "Food".to_owned(),
                parent_id: None,
                kind: CategoryKind::Expense,
            },
            Category {
                id: 2,
                name: "Groceries".to_owned(),
                parent_id: Some(1),
                kind: CategoryKind::Expense,
            },
            Category {
                id: 3,
                name: "Wages".to_owned(),
                parent_id: None,
                kind: CategoryKind::Income,
            },
        ])
    }

    #[test]
    fn holds_ignores_amount_sign() {
        let mut row = Row::empty(1, Some(date!(2024 - 06 - 03)));
        row.amount = Some(-12.5);

        assert!(row.holds(FieldChange::Amount(Some(12.5))));
        assert!(row.holds(FieldChange::Date(Some(date!(2024 - 06 - 03)))));
        assert!(!row.holds(FieldChange::Amount(Some(13.0))));
        assert!(!row.holds(FieldChange::Account(Some(1))));
    }

    #[test]
    fn parse_blank_value_clears_field() {
        assert_eq!(
            FieldChange::parse(Field::Budget, "  "),
            Ok(FieldChange::Budget(None))
        );
    }

    #[test]
    fn parse_amount_with_separators() {
        assert_eq!(
            FieldChange::parse(Field::Amount, "1,234.50"),
            Ok(FieldChange::Amount(Some(1234.5)))
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            FieldChange::parse(Field::Amount, "12abc"),
            Err(Error::InvalidFieldValue {
                field: Field::Amount,
                value: "12abc".to_owned()
            })
        );
        assert!(FieldChange::parse(Field::Amount, "NaN").is_err());
        assert!(FieldChange::parse(Field::Date, "2024-13-01").is_err());
        assert!(FieldChange::parse(Field::Account, "one").is_err());
    }

    #[test]
    fn parse_date() {
        assert_eq!(
            FieldChange::parse(Field::Date, "2024-06-03"),
            Ok(FieldChange::Date(Some(date!(2024 - 06 - 03))))
        );
    }

    #[test]
    fn from_transaction_fills_category_names() {
        let transaction = Transaction {
            id: 7,
            date: date!(2024 - 06 - 04),
            amount: -20.0,
            account_id: 1,
            budget_id: Some(3),
            category_id: 2,
        };

        let row = Row::from_transaction(9, &transaction, &categories());

        assert_eq!(row.id, 9);
        assert_eq!(row.transaction_id, Some(7));
        assert_eq!(row.category_name, "Groceries");
        assert_eq!(row.category_parent_name, "Food");
        assert_eq!(row.category_label(), "Food / Groceries");
    }

    #[test]
    fn draft_amount_follows_category_kind() {
        let mut row = Row::empty(1, Some(date!(2024 - 06 - 03)));
        row.account = Some(1);
        row.amount = Some(25.0);
        row.category = Some(2);

        let expense = row.to_draft(&categories()).unwrap();
        row.category = Some(3);
        row.amount = Some(-100.0);
        let income = row.to_draft(&categories()).unwrap();

        assert_eq!(expense.amount, -25.0);
        assert_eq!(income.amount, 100.0);
    }

    #[test]
    fn draft_needs_required_fields() {
        let mut row = Row::empty(1, Some(date!(2024 - 06 - 03)));
        row.category = Some(2);
        row.amount = Some(25.0);

        assert_eq!(row.to_draft(&categories()), None);
    }

    #[test]
    fn clearing_category_clears_names() {
        let mut row = Row::empty(1, None);
        row.category = Some(2);
        row.refresh_category_names(&categories());

        row.clear(Field::Category);

        assert_eq!(row.category, None);
        assert!(row.category_name.is_empty());
        assert!(row.category_parent_name.is_empty());
    }
}
