//! Creates the application's database schema.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, account::create_account_table, budget::create_budget_table,
    category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the tables for the domain models, enforcing foreign keys.
///
/// Tables are created in dependency order inside a single transaction, so
/// either every table is created or none are. Existing tables are kept.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
