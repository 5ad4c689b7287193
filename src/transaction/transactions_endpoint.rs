//! Defines the route handler that returns a month's transactions together
//! with their statistics, computed in memory.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    db::run_query,
    month::MonthFilter,
    statistics::{MonthQuery, Statistics, StatisticsConfig, engine},
};

use super::{core::Transaction, query::get_transactions};

/// The state needed for the transactions endpoint.
#[derive(Debug, Clone)]
pub struct TransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The buckets and policies for computing statistics.
    pub statistics_config: Arc<StatisticsConfig>,
}

impl FromRef<AppState> for TransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            statistics_config: state.statistics_config.clone(),
        }
    }
}

/// A month's transactions and the statistics derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionsWithStatistics {
    /// Every transaction sold in the month, in stored order.
    pub transactions: Vec<Transaction>,
    /// Statistics for those transactions.
    pub statistics: Statistics,
}

/// Get every transaction sold in a month along with its statistics.
///
/// All stored transactions are read and then filtered and aggregated in
/// memory.
pub async fn get_transactions_with_statistics(
    State(state): State<TransactionsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<TransactionsWithStatistics>, Error> {
    let month = MonthFilter::from_query(query.month.as_deref());

    let all_transactions = run_query(&state.db_connection, |connection| {
        get_transactions(None, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let filtered = engine::filter_by_month(&all_transactions, month);
    let statistics = engine::summarize(&filtered, &state.statistics_config);
    let transactions = filtered.into_iter().cloned().collect();

    Ok(Json(TransactionsWithStatistics {
        transactions,
        statistics,
    }))
}
