//! The persistence API consumed by the transaction grid.
//!
//! The grid only talks to persistence through [TransactionApi], so the edit
//! session can be driven by any backend. [SqliteApi] is the implementation
//! used by the web server.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::FromRef;
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::{self, Account},
    budget::{self, Budget},
    category::{self, Category},
    date_range::DateRange,
    transaction::{self, Transaction, TransactionDraft, TransactionId},
    user::UserId,
};

/// The ways a persistence request can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ApiError {
    /// The server rejected the change, e.g. it refers to a budget or account
    /// that was deleted or no longer matches.
    #[error("the change was rejected: {0}")]
    Conflict(String),

    /// The request did not complete and may be retried.
    #[error("the request could not be completed: {0}")]
    Network(String),

    /// The record, or an entity it depends on, no longer exists.
    #[error("the record no longer exists")]
    NotFound,
}

/// Persistence operations needed by the transaction grid.
pub trait TransactionApi {
    /// Insert the draft as a new transaction, or update the transaction with
    /// the draft's ID, returning the stored record.
    fn create_or_update_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<Transaction, ApiError>;

    fn delete_transaction(&self, id: TransactionId) -> Result<(), ApiError>;

    fn list_accounts(&self) -> Result<Vec<Account>, ApiError>;

    fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Budgets whose week starts between `week_start` and `week_end`,
    /// restricted to `owner` when it is given.
    fn list_budgets_for_week(
        &self,
        week_start: Date,
        week_end: Date,
        owner: Option<UserId>,
    ) -> Result<Vec<Budget>, ApiError>;

    /// Transactions dated within `range`, oldest first.
    fn list_transactions(&self, range: DateRange) -> Result<Vec<Transaction>, ApiError>;
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound => ApiError::NotFound,
            Error::BudgetMismatch(budget_id) => ApiError::Conflict(format!(
                "budget {budget_id} does not belong to the account's owner or the transaction's week"
            )),
            Error::InvalidReference => ApiError::Conflict(
                "the account or category no longer exists".to_owned(),
            ),
            Error::DatabaseLockError => {
                ApiError::Network("the database is temporarily unavailable".to_owned())
            }
            error => {
                tracing::error!("unexpected persistence error: {error}");
                ApiError::Network(error.to_string())
            }
        }
    }
}

/// A [TransactionApi] backed by the application's SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteApi {
    db_connection: Arc<Mutex<Connection>>,
}

impl SqliteApi {
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self { db_connection }
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError.into())
    }
}

impl FromRef<AppState> for SqliteApi {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.db_connection.clone())
    }
}

impl TransactionApi for SqliteApi {
    fn create_or_update_transaction(
        &self,
        draft: &TransactionDraft,
    ) -> Result<Transaction, ApiError> {
        let connection = self.connection()?;

        transaction::upsert_transaction(draft, &connection).map_err(ApiError::from)
    }

    fn delete_transaction(&self, id: TransactionId) -> Result<(), ApiError> {
        let connection = self.connection()?;

        match transaction::delete_transaction(id, &connection)? {
            0 => Err(ApiError::NotFound),
            _ => Ok(()),
        }
    }

    fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        let connection = self.connection()?;

        account::list_accounts(&connection).map_err(ApiError::from)
    }

    fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let connection = self.connection()?;

        category::list_categories(&connection).map_err(ApiError::from)
    }

    fn list_budgets_for_week(
        &self,
        week_start: Date,
        week_end: Date,
        owner: Option<UserId>,
    ) -> Result<Vec<Budget>, ApiError> {
        let connection = self.connection()?;

        budget::list_budgets_for_week(week_start, week_end, owner, &connection)
            .map_err(ApiError::from)
    }

    fn list_transactions(&self, range: DateRange) -> Result<Vec<Transaction>, ApiError> {
        let connection = self.connection()?;

        transaction::list_transactions_in_range(range, &connection).map_err(ApiError::from)
    }
}
