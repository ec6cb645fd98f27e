use rusqlite::Connection;

use crate::{Error, user::UserId};

pub type AccountId = i64;

/// A bank account, credit card or cash wallet owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The display name of the account.
    pub name: String,
    /// The user that owns the account.
    pub owner: UserId,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            owner_id INTEGER NOT NULL,
            FOREIGN KEY(owner_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let owner = UserId::new(row.get(2)?);

    Ok(Account { id, name, owner })
}

/// Create a new account owned by `owner`.
///
/// # Errors
/// Returns [Error::DuplicateAccountName] if an account called `name` already
/// exists, or [Error::SqlError] for any other SQL error.
pub fn create_account(name: &str, owner: UserId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            "INSERT INTO account (name, owner_id) VALUES (?1, ?2) RETURNING id, name, owner_id",
            (name, owner.as_i64()),
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateAccountName(name.to_owned()),
            error => error.into(),
        })
}

/// Get every account ordered by name.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name, owner_id FROM account ORDER BY name ASC")?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error, initialize_db,
        user::{UserId, create_user},
    };

    use super::{create_account, create_account_table, list_accounts};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        connection
    }

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }

    #[test]
    fn lists_accounts_by_name() {
        let connection = get_test_connection();
        let user = create_user("Sam", &connection).unwrap();
        let savings = create_account("Savings", user.id, &connection).unwrap();
        let cheque = create_account("Everyday", user.id, &connection).unwrap();

        let accounts = list_accounts(&connection).unwrap();

        assert_eq!(accounts, vec![cheque, savings]);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let connection = get_test_connection();
        let user = create_user("Sam", &connection).unwrap();
        create_account("Savings", user.id, &connection).unwrap();

        let result = create_account("Savings", user.id, &connection);

        assert_eq!(result, Err(Error::DuplicateAccountName("Savings".to_owned())));
    }

    #[test]
    fn owner_must_exist() {
        let connection = get_test_connection();

        let result = create_account("Savings", UserId::new(99), &connection);

        assert!(result.is_err(), "want error for missing owner, got {result:?}");
    }
}
