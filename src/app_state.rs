//! Implements a struct that holds the state of the web server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, grid::EditSession, preferences::ViewPreferences};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The rows of the transaction grid and their edit states.
    ///
    /// Take this lock before the database lock, never after.
    pub grid_session: Arc<Mutex<EditSession>>,

    /// The currency, date range and report shown by the grid and summary.
    pub preferences: Arc<Mutex<ViewPreferences>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, local_timezone: &str) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
            grid_session: Arc::new(Mutex::new(EditSession::new())),
            preferences: Arc::new(Mutex::new(ViewPreferences::default())),
        })
    }
}
