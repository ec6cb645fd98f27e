//! Ledgergrid is a web app for recording transactions in an editable grid and
//! summarising spending against weekly budgets.
//!
//! This library provides a web server that directly serves HTML pages. The
//! grid keeps each row's edit state on the server and the browser sends every
//! change as it happens.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod api;
mod app_state;
mod budget;
mod category;
mod date_range;
mod db;
mod endpoints;
mod error;
mod error_pages;
mod grid;
mod html;
mod logging;
mod navigation;
mod preferences;
mod routing;
mod summary;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use account::{Account, AccountId, create_account};
pub use api::{ApiError, SqliteApi, TransactionApi};
pub use app_state::AppState;
pub use budget::{Budget, BudgetId, create_budget};
pub use category::{Category, CategoryId, CategoryKind, create_category};
pub use date_range::{DateRange, week_of};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{
    Transaction, TransactionDraft, TransactionId, get_transaction, upsert_transaction,
};
pub use user::{User, UserId, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
