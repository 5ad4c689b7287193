//! Defines the route handler that returns the transaction list, sale totals
//! and both charts in one response.

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
    pagination::{Pagination, PaginationConfig},
    transaction::{ListQuery, Transaction, search_transactions},
};

use super::{
    config::StatisticsConfig,
    engine::{CategoryCount, PriceRangeCount, SaleSummary},
    store::{get_category_counts, get_price_range_counts, get_sale_summary},
};

/// The state needed for the combined endpoint.
#[derive(Debug, Clone)]
pub struct CombinedState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The buckets and policies for computing statistics.
    pub statistics_config: Arc<StatisticsConfig>,
    /// The config that controls paging of the transaction list.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CombinedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            statistics_config: state.statistics_config.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Everything the dashboard needs for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedData {
    /// One page of matching transactions.
    pub transactions: Vec<Transaction>,
    /// Sale totals for the month.
    pub statistics: SaleSummary,
    /// Transactions per price range.
    pub bar_chart: Vec<PriceRangeCount>,
    /// Transactions per category.
    pub pie_chart: Vec<CategoryCount>,
}

/// Get the transaction list, sale totals, bar chart and pie chart for a
/// month.
///
/// The four parts are independent queries. They run concurrently and the
/// response is sent once all of them have finished. If any of them fails
/// the whole request fails.
pub async fn get_combined_data(
    State(state): State<CombinedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CombinedData>, Error> {
    let month = MonthFilter::from_query(query.month.as_deref());
    let search = query.search.unwrap_or_default();
    let pagination = Pagination::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        &state.pagination_config,
    );
    let policy = state.statistics_config.sale_amount_policy;
    let statistics_config = state.statistics_config.clone();

    let (transactions, statistics, bar_chart, pie_chart) = tokio::try_join!(
        run_query(&state.db_connection, move |connection| {
            search_transactions(month, &search, pagination, connection)
        }),
        run_query(&state.db_connection, move |connection| {
            get_sale_summary(month, policy, connection)
        }),
        run_query(&state.db_connection, move |connection| {
            get_price_range_counts(month, &statistics_config.price_ranges, connection)
        }),
        run_query(&state.db_connection, move |connection| {
            get_category_counts(month, connection)
        }),
    )
    .inspect_err(|error| tracing::error!("could not get combined data: {error}"))?;

    Ok(Json(CombinedData {
        transactions,
        statistics,
        bar_chart,
        pie_chart,
    }))
}
