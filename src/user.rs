//! Code for creating the user table and fetching users from the database.
//!
//! Users own accounts and budgets. A budget may only be attached to a
//! transaction whose account has the same owner.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors when comparing account and budget owners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A person whose money is tracked by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn create_user(name: &str, connection: &Connection) -> Result<User, Error> {
    connection.execute("INSERT INTO user (name) VALUES (?1)", (name,))?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        name: name.to_owned(),
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, name FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], |row| {
            Ok(User {
                id: UserId::new(row.get(0)?),
                name: row.get(1)?,
            })
        })
        .map_err(|error| error.into())
}
