//! Weekly budgets: a planned spending allocation for one user for one week.

use rusqlite::{Connection, Row};
use time::Date;

use crate::{
    Error,
    date_range::{DateRange, week_of},
    user::UserId,
};

pub type BudgetId = i64;

/// A planned spending allocation for one user for one calendar week.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    /// A short label, e.g. "Groceries".
    pub name: String,
    /// The user the budget belongs to.
    pub owner: UserId,
    /// The Monday that starts the budget's week.
    pub week_start: Date,
    /// The amount of money planned to be spent, as a positive number.
    pub amount: f64,
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                owner_id INTEGER NOT NULL,
                week_start TEXT NOT NULL,
                amount REAL NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_week_owner ON budget(week_start, owner_id);",
        (),
    )?;

    Ok(())
}

pub fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: UserId::new(row.get(2)?),
        week_start: row.get(3)?,
        amount: row.get(4)?,
    })
}

/// Create a budget for the week containing `date`.
///
/// The stored week start is always the Monday of that week.
///
/// # Errors
/// Returns [Error::SqlError] if `owner` does not exist or there is some other SQL error.
pub fn create_budget(
    name: &str,
    owner: UserId,
    date: Date,
    amount: f64,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .query_row(
            "INSERT INTO budget (name, owner_id, week_start, amount) VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, owner_id, week_start, amount",
            (name, owner.as_i64(), week_of(date), amount),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Get a budget by its `id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such budget.
pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .query_row(
            "SELECT id, name, owner_id, week_start, amount FROM budget WHERE id = ?1",
            (id,),
            map_budget_row,
        )
        .map_err(Error::from)
}

/// Get the budgets whose week starts between `week_start` and `week_end`,
/// optionally only those belonging to `owner`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_budgets_for_week(
    week_start: Date,
    week_end: Date,
    owner: Option<UserId>,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, name, owner_id, week_start, amount FROM budget
             WHERE week_start BETWEEN ?1 AND ?2 AND (?3 IS NULL OR owner_id = ?3)
             ORDER BY week_start ASC, name ASC",
        )?
        .query_map(
            (week_start, week_end, owner.map(|owner| owner.as_i64())),
            map_budget_row,
        )?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Get every budget for the weeks overlapping `range`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_budgets_in_range(range: DateRange, connection: &Connection) -> Result<Vec<Budget>, Error> {
    list_budgets_for_week(week_of(range.start), range.end, None, connection)
}
