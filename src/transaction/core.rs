//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    budget::{BudgetId, get_budget},
    category::CategoryId,
    date_range::{DateRange, week_of},
    user::UserId,
};

pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Positive values represent income, negative values represent expenses.
    pub amount: f64,
    /// The account the money moved in or out of.
    pub account_id: AccountId,
    /// The weekly budget the transaction counts towards, if any.
    pub budget_id: Option<BudgetId>,
    /// The leaf category of the transaction.
    pub category_id: CategoryId,
}

/// The data needed to create a transaction, or to overwrite an existing one
/// when `id` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// The transaction to overwrite, or `None` to insert a new one.
    pub id: Option<TransactionId>,
    pub date: Date,
    /// Signed amount, negative for expenses.
    pub amount: f64,
    pub account_id: AccountId,
    pub budget_id: Option<BudgetId>,
    pub category_id: CategoryId,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                amount REAL NOT NULL,
                account_id INTEGER NOT NULL,
                budget_id INTEGER,
                category_id INTEGER NOT NULL,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(budget_id) REFERENCES budget(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE RESTRICT
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date ON \"transaction\"(date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        account_id: row.get(3)?,
        budget_id: row.get(4)?,
        category_id: row.get(5)?,
    })
}

/// Insert `draft` as a new transaction, or update the transaction with the
/// draft's ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the draft has an ID that does not exist,
/// - [Error::BudgetMismatch] if the budget's owner or week does not match the
///   account's owner and the transaction's week,
/// - [Error::InvalidReference] if the account or category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_transaction(
    draft: &TransactionDraft,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if let Some(budget_id) = draft.budget_id {
        check_budget_matches(budget_id, draft, connection)?;
    }

    let transaction = match draft.id {
        None => connection.query_row(
            "INSERT INTO \"transaction\" (date, amount, account_id, budget_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, date, amount, account_id, budget_id, category_id",
            params![
                draft.date,
                draft.amount,
                draft.account_id,
                draft.budget_id,
                draft.category_id,
            ],
            map_transaction_row,
        ),
        Some(id) => connection.query_row(
            "UPDATE \"transaction\"
             SET date = ?1, amount = ?2, account_id = ?3, budget_id = ?4, category_id = ?5
             WHERE id = ?6
             RETURNING id, date, amount, account_id, budget_id, category_id",
            params![
                draft.date,
                draft.amount,
                draft.account_id,
                draft.budget_id,
                draft.category_id,
                id,
            ],
            map_transaction_row,
        ),
    }
    .map_err(|error| match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Error::InvalidReference,
        error => error.into(),
    })?;

    Ok(transaction)
}

fn check_budget_matches(
    budget_id: BudgetId,
    draft: &TransactionDraft,
    connection: &Connection,
) -> Result<(), Error> {
    let budget = match get_budget(budget_id, connection) {
        Ok(budget) => budget,
        Err(Error::NotFound) => return Err(Error::BudgetMismatch(budget_id)),
        Err(error) => return Err(error),
    };
    let account_owner: i64 = connection
        .query_row(
            "SELECT owner_id FROM account WHERE id = ?1",
            (draft.account_id,),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidReference,
            error => error.into(),
        })?;

    if budget.owner != UserId::new(account_owner) || budget.week_start != week_of(draft.date) {
        return Err(Error::BudgetMismatch(budget_id));
    }

    Ok(())
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, date, amount, account_id, budget_id, category_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

type RowsAffected = usize;

/// Delete the transaction with `id`, returning the number of rows deleted.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id",
            &[(":id", &id)],
        )
        .map_err(Error::from)
}

/// Get the transactions dated within `range`, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn list_transactions_in_range(
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, date, amount, account_id, budget_id, category_id
             FROM \"transaction\"
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC, id ASC",
        )?
        .query_map((range.start, range.end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{Account, create_account},
        budget::create_budget,
        category::{Category, CategoryKind, create_category},
        date_range::DateRange,
        initialize_db,
        user::create_user,
    };

    use super::{
        TransactionDraft, delete_transaction, get_transaction, list_transactions_in_range,
        upsert_transaction,
    };

    struct Fixture {
        connection: Connection,
        account: Account,
        category: Category,
    }

    fn get_fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        let user = create_user("Sam", &connection).unwrap();
        let account = create_account("Everyday", user.id, &connection).unwrap();
        let category =
            create_category("Groceries", None, CategoryKind::Expense, &connection).unwrap();

        Fixture {
            connection,
            account,
            category,
        }
    }

    fn draft(fixture: &Fixture) -> TransactionDraft {
        TransactionDraft {
            id: None,
            date: date!(2024 - 06 - 03),
            amount: -12.3,
            account_id: fixture.account.id,
            budget_id: None,
            category_id: fixture.category.id,
        }
    }

    #[test]
    fn insert_then_update() {
        let fixture = get_fixture();

        let created = upsert_transaction(&draft(&fixture), &fixture.connection).unwrap();
        let updated = upsert_transaction(
            &TransactionDraft {
                id: Some(created.id),
                amount: -45.6,
                ..draft(&fixture)
            },
            &fixture.connection,
        )
        .unwrap();

        assert_eq!(created.id, updated.id);
        assert_eq!(updated.amount, -45.6);
        assert_eq!(get_transaction(created.id, &fixture.connection), Ok(updated));
    }

    #[test]
    fn update_missing_transaction_fails() {
        let fixture = get_fixture();

        let result = upsert_transaction(
            &TransactionDraft {
                id: Some(42),
                ..draft(&fixture)
            },
            &fixture.connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn budget_from_other_week_is_rejected() {
        let fixture = get_fixture();
        let budget = create_budget(
            "Food",
            fixture.account.owner,
            date!(2024 - 06 - 10),
            100.0,
            &fixture.connection,
        )
        .unwrap();

        let result = upsert_transaction(
            &TransactionDraft {
                budget_id: Some(budget.id),
                ..draft(&fixture)
            },
            &fixture.connection,
        );

        assert_eq!(result, Err(Error::BudgetMismatch(budget.id)));
    }

    #[test]
    fn budget_from_other_owner_is_rejected() {
        let fixture = get_fixture();
        let other = create_user("Alex", &fixture.connection).unwrap();
        let budget = create_budget(
            "Food",
            other.id,
            date!(2024 - 06 - 03),
            100.0,
            &fixture.connection,
        )
        .unwrap();

        let result = upsert_transaction(
            &TransactionDraft {
                budget_id: Some(budget.id),
                ..draft(&fixture)
            },
            &fixture.connection,
        );

        assert_eq!(result, Err(Error::BudgetMismatch(budget.id)));
    }

    #[test]
    fn missing_category_is_invalid_reference() {
        let fixture = get_fixture();

        let result = upsert_transaction(
            &TransactionDraft {
                category_id: 99,
                ..draft(&fixture)
            },
            &fixture.connection,
        );

        assert_eq!(result, Err(Error::InvalidReference));
    }

    #[test]
    fn delete_removes_transaction() {
        let fixture = get_fixture();
        let created = upsert_transaction(&draft(&fixture), &fixture.connection).unwrap();

        let rows_affected = delete_transaction(created.id, &fixture.connection).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(
            get_transaction(created.id, &fixture.connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_in_range_is_inclusive() {
        let fixture = get_fixture();
        for date in [
            date!(2024 - 06 - 02),
            date!(2024 - 06 - 03),
            date!(2024 - 06 - 09),
            date!(2024 - 06 - 10),
        ] {
            upsert_transaction(
                &TransactionDraft {
                    date,
                    ..draft(&fixture)
                },
                &fixture.connection,
            )
            .unwrap();
        }

        let transactions = list_transactions_in_range(
            DateRange {
                start: date!(2024 - 06 - 03),
                end: date!(2024 - 06 - 09),
            },
            &fixture.connection,
        )
        .unwrap();

        let dates: Vec<_> = transactions.iter().map(|t| t.date).collect();
        assert_eq!(dates, vec![date!(2024 - 06 - 03), date!(2024 - 06 - 09)]);
    }
}
