//! Route handlers for the statistics and chart endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, db::run_query, month::MonthFilter};

use super::{
    config::StatisticsConfig,
    engine::{CategoryCount, PriceRangeCount, SaleSummary},
    store::{get_category_counts, get_price_range_counts, get_sale_summary},
};

/// The state needed for the statistics endpoints.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The buckets and policies for computing statistics.
    pub statistics_config: Arc<StatisticsConfig>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            statistics_config: state.statistics_config.clone(),
        }
    }
}

/// The query parameters for endpoints that only filter by month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// A month name or number. Invalid values are ignored.
    pub month: Option<String>,
}

/// Get the sale totals for a month.
pub async fn get_statistics(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<SaleSummary>, Error> {
    let month = MonthFilter::from_query(query.month.as_deref());
    let policy = state.statistics_config.sale_amount_policy;

    run_query(&state.db_connection, move |connection| {
        get_sale_summary(month, policy, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not get sale summary: {error}"))
    .map(Json)
}

/// Get the number of transactions in each price range for a month.
pub async fn get_bar_chart(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<PriceRangeCount>>, Error> {
    let month = MonthFilter::from_query(query.month.as_deref());
    let statistics_config = state.statistics_config.clone();

    run_query(&state.db_connection, move |connection| {
        get_price_range_counts(month, &statistics_config.price_ranges, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not get price range counts: {error}"))
    .map(Json)
}

/// Get the number of transactions in each category for a month.
///
/// Every category in the store is reported, not just the configured ones.
pub async fn get_pie_chart(
    State(state): State<StatisticsState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<CategoryCount>>, Error> {
    let month = MonthFilter::from_query(query.month.as_deref());

    run_query(&state.db_connection, move |connection| {
        get_category_counts(month, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not get category counts: {error}"))
    .map(Json)
}
