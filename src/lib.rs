//! Sales stats is a small analytics API for e-commerce transaction records.
//!
//! The library serves transactions and statistics derived from them (sale
//! totals, a category breakdown and a price-range histogram), filtered by
//! calendar month, as JSON over HTTP.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod month;
mod not_found;
mod pagination;
mod routing;
mod seed;
mod statistics;
mod transaction;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use month::MonthFilter;
pub use pagination::{Pagination, PaginationConfig};
pub use routing::build_router;
pub use seed::{
    DEFAULT_SEED_URL, SeedSummary, SourceBatch, SourceTransaction, fetch_source_transactions,
    load_transactions_from_file, parse_source_transactions, seed_transactions,
};
pub use statistics::{
    CategoryCount, CombinedData, PriceRange, PriceRangeCount, SaleAmountPolicy, SaleSummary,
    Statistics, StatisticsConfig, category_counts, compute_statistics, filter_by_month, summarize,
};
pub use transaction::{
    NewTransaction, Transaction, TransactionsWithStatistics, count_transactions,
    create_transaction, get_transaction, get_transactions, insert_transactions,
    search_transactions,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    ///
    /// The backing store could not be read or written. Clients only ever see
    /// a generic internal server error for this.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// A transaction with the same source ID is already stored.
    ///
    /// Source IDs identify records from the upstream feed, rejecting
    /// duplicates keeps repeated bulk loads from storing a record twice.
    #[error("a transaction with this source ID already exists")]
    DuplicateSourceId,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The external source used to seed the store could not be reached or
    /// returned an error status.
    #[error("could not load transactions from the upstream source: {0}")]
    UpstreamLoadFailure(String),

    /// The seed data was reachable but could not be parsed as a list of
    /// transactions.
    #[error("the seed data is not a valid list of transactions: {0}")]
    InvalidSourceData(String),

    /// The bucket configuration for statistics is unusable, e.g. the price
    /// ranges overlap or leave gaps.
    #[error("invalid statistics config: {0}")]
    InvalidStatisticsConfig(String),

    /// A query running on the blocking thread pool panicked or was
    /// cancelled.
    #[error("a database task failed: {0}")]
    TaskFailed(String),

    /// A file could not be read.
    #[error("could not read file: {0}")]
    Io(String),
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
        let (status, message) = match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "the requested resource could not be found".to_owned(),
            ),
            Error::UpstreamLoadFailure(_) | Error::InvalidSourceData(_) => {
                tracing::error!("Failed to initialize the transaction store: {}", self);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an unexpected error occurred, check the server logs for more details"
                        .to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
