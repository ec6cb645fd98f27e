//! Categories classify a transaction as income or expense.
//!
//! Categories form a two-level hierarchy, e.g. "Food" → "Groceries". Only
//! leaf categories may be assigned to a transaction.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::Error;

pub type CategoryId = i64;

/// Whether money in a category is earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    fn from_db(text: &str) -> Option<Self> {
        match text {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Give `amount` the sign used by this kind of category.
    ///
    /// Expenses are stored as negative amounts, income as positive amounts.
    pub fn signed_amount(self, amount: f64) -> f64 {
        match self {
            Self::Income => amount.abs(),
            Self::Expense => -amount.abs(),
        }
    }
}

/// A category for expenses and income, e.g., 'Groceries', 'Eating Out', 'Wages'.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category {
    /// The id of the category.
    pub id: CategoryId,
    /// The name of the category.
    pub name: String,
    /// The parent category, `None` for top-level categories.
    pub parent_id: Option<CategoryId>,
    /// Whether the category is for income or expenses.
    pub kind: CategoryKind,
}

/// Lookups over a loaded set of categories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    categories: Vec<Category>,
}

impl CategoryTree {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// The name of the parent of `category`, or an empty string if it has none.
    pub fn parent_name(&self, category: &Category) -> String {
        category
            .parent_id
            .and_then(|parent_id| self.get(parent_id))
            .map(|parent| parent.name.clone())
            .unwrap_or_default()
    }

    /// A category is a leaf if no other category has it as a parent.
    pub fn is_leaf(&self, id: CategoryId) -> bool {
        !self
            .categories
            .iter()
            .any(|category| category.parent_id == Some(id))
    }

    /// Leaf categories, sorted by parent name then name, for select inputs.
    pub fn leaves(&self) -> Vec<&Category> {
        let mut leaves: Vec<&Category> = self
            .categories
            .iter()
            .filter(|category| self.is_leaf(category.id))
            .collect();

        leaves.sort_by_cached_key(|category| (self.parent_name(category), category.name.clone()));
        leaves
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }
}

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id INTEGER,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                FOREIGN KEY(parent_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let kind_text: String = row.get(3)?;
    let kind = CategoryKind::from_db(&kind_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("invalid category kind {kind_text:?}").into(),
        )
    })?;

    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        kind,
    })
}

/// Create a category, optionally under `parent_id`.
///
/// # Errors
/// Returns [Error::EmptyCategoryName] if `name` is blank, or [Error::SqlError]
/// if the parent does not exist or there is some other SQL error.
pub fn create_category(
    name: &str,
    parent_id: Option<CategoryId>,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyCategoryName);
    }

    connection
        .query_row(
            "INSERT INTO category (name, parent_id, kind) VALUES (?1, ?2, ?3)
             RETURNING id, name, parent_id, kind",
            (name, parent_id, kind.as_str()),
            map_category_row,
        )
        .map_err(Error::from)
}

/// Get every category.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, parent_id, kind FROM category ORDER BY id ASC")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}
