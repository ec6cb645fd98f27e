//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert,
    api::ApiError,
    budget::BudgetId,
    error_pages::{InternalServerError, NotFoundError},
    grid::{Field, FieldSet, RowId},
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A date string could not be parsed as a `YYYY-MM-DD` date.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// A value submitted for a grid cell could not be parsed.
    #[error("\"{value}\" is not a valid value for {field}")]
    InvalidFieldValue {
        /// The field the value was submitted for.
        field: Field,
        /// The raw value.
        value: String,
    },

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// An empty string was used as the currency symbol.
    #[error("Currency symbol cannot be empty")]
    EmptyCurrencySymbol,

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// The budget on a transaction belongs to a different user than the
    /// account, or to a different week than the transaction date.
    #[error("budget {0} does not match the transaction's account owner and week")]
    BudgetMismatch(BudgetId),

    /// A transaction refers to an account or category that does not exist.
    #[error("the transaction refers to an account or category that does not exist")]
    InvalidReference,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the grid's edit session.
    #[error("could not acquire the edit session lock")]
    SessionLockError,

    /// Could not acquire the lock on the view preferences.
    #[error("could not acquire the view preferences lock")]
    PreferencesLockError,

    /// The grid has no row with the given ID.
    #[error("row {0} is not in the grid")]
    RowNotFound(RowId),

    /// Required fields are missing, so the row cannot be saved.
    #[error("the row has invalid fields: {}", field_list(.0))]
    InvalidFields(FieldSet),

    /// The row is already being saved.
    #[error("row {0} is already being saved")]
    SaveInProgress(RowId),

    /// The operation needs the row to be in edit mode.
    #[error("row {0} is not being edited")]
    NotEditing(RowId),

    /// A delete was confirmed without first being requested.
    #[error("deleting row {0} was not requested")]
    DeleteNotRequested(RowId),

    /// The persistence API rejected a request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

fn field_list(fields: &FieldSet) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::Api(ApiError::Network(_)) => InternalServerError {
                description: "Could not load your transactions",
                fix: "The database is temporarily unavailable. Please try again.",
            }
            .into_response(),
            Error::DatabaseLockError | Error::SessionLockError | Error::PreferencesLockError => {
                InternalServerError::default().into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an alert that can be shown next to the grid.
    pub fn into_alert(self) -> (StatusCode, Alert) {
        match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::InvalidFields(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Could not save transaction".to_owned(),
                    details: format!("Fill in the required fields: {}.", field_list(&fields)),
                },
            ),
            error @ (Error::InvalidFieldValue { .. } | Error::InvalidDate(_)) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid value".to_owned(),
                    details: format!("{error}."),
                },
            ),
            Error::EmptyCurrencySymbol => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Currency symbol cannot be empty".to_owned(),
                },
            ),
            Error::RowNotFound(_) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Row not found".to_owned(),
                    details: "The row is no longer in the grid. \
                    Try refreshing the page."
                        .to_owned(),
                },
            ),
            Error::SaveInProgress(_) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Save in progress".to_owned(),
                    details: "Wait for the current save to finish before changing this row."
                        .to_owned(),
                },
            ),
            Error::NotEditing(_) => (
                StatusCode::CONFLICT,
                Alert::ErrorSimple {
                    message: "Click edit before changing this row".to_owned(),
                },
            ),
            Error::DeleteNotRequested(_) => (
                StatusCode::CONFLICT,
                Alert::ErrorSimple {
                    message: "Click delete before confirming".to_owned(),
                },
            ),
            Error::Api(ApiError::Conflict(details)) => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "The change was rejected".to_owned(),
                    details,
                },
            ),
            Error::Api(ApiError::Network(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Alert::Error {
                    message: "Could not reach the database".to_owned(),
                    details: "Your changes are still here. Try saving again.".to_owned(),
                },
            ),
            Error::Api(ApiError::NotFound) => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Transaction no longer exists".to_owned(),
                    details: "It was deleted elsewhere and has been removed from the grid."
                        .to_owned(),
                },
            ),
            Error::DatabaseLockError | Error::SessionLockError | Error::PreferencesLockError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details: "The server is busy. Try again in a moment.".to_owned(),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details: "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                    },
                )
            }
        }
    }

    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = self.into_alert();

        (status_code, alert.into_html()).into_response()
    }
}
