//! Defines the route handler for searching transactions one page at a time.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::run_query,
    month::MonthFilter,
    pagination::{Pagination, PaginationConfig},
};

use super::{core::Transaction, query::search_transactions};

/// The state needed for listing transactions.
#[derive(Debug, Clone)]
pub struct ListState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls paging of the transaction list.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for the transaction list.
///
/// Every field is read as text so that malformed values fall back to their
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// A month name or number.
    pub month: Option<String>,
    /// Text to look for in the title, description or price.
    pub search: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of transactions per page.
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
}

/// Get one page of transactions matching the month and search text.
pub async fn list_transactions(
    State(state): State<ListState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let month = MonthFilter::from_query(query.month.as_deref());
    let search = query.search.unwrap_or_default();
    let pagination = Pagination::from_query(
        query.page.as_deref(),
        query.per_page.as_deref(),
        &state.pagination_config,
    );

    run_query(&state.db_connection, move |connection| {
        search_transactions(month, &search, pagination, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not search transactions: {error}"))
    .map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        pagination::PaginationConfig,
        transaction::{Transaction, insert_transactions},
    };

    use super::{ListState, list_transactions};

    fn get_test_server(count: usize) -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let batch: Vec<_> = (1..=count)
            .map(|i| {
                Transaction::build(&format!("Lamp #{i}"), 20.0, "home", "2022-03-01")
                    .description(if i % 3 == 0 { "brass finish" } else { "steel finish" })
            })
            .collect();
        insert_transactions(&batch, &connection).expect("Could not insert test transactions");

        let state = ListState {
            db_connection: Arc::new(Mutex::new(connection)),
            pagination_config: PaginationConfig::default(),
        };

        let app = Router::new()
            .route(endpoints::LIST, get(list_transactions))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    fn titles(transactions: &[Transaction]) -> Vec<String> {
        transactions.iter().map(|t| t.title.clone()).collect()
    }

    #[tokio::test]
    async fn defaults_to_first_page_of_ten() {
        let server = get_test_server(15);

        let response = server.get(endpoints::LIST).await;

        response.assert_status_ok();
        let want: Vec<_> = (1..=10).map(|i| format!("Lamp #{i}")).collect();
        assert_eq!(titles(&response.json::<Vec<Transaction>>()), want);
    }

    #[tokio::test]
    async fn second_page_has_the_remaining_five() {
        let server = get_test_server(15);

        let response = server
            .get(endpoints::LIST)
            .add_query_param("month", "March")
            .add_query_param("page", "2")
            .add_query_param("perPage", "10")
            .await;

        response.assert_status_ok();
        let want: Vec<_> = (11..=15).map(|i| format!("Lamp #{i}")).collect();
        assert_eq!(titles(&response.json::<Vec<Transaction>>()), want);
    }

    #[tokio::test]
    async fn malformed_paging_falls_back_to_defaults() {
        let server = get_test_server(15);

        let response = server
            .get(endpoints::LIST)
            .add_query_param("page", "first")
            .add_query_param("perPage", "-1")
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Transaction>>().len(), 10);
    }

    #[tokio::test]
    async fn filters_by_search_text() {
        let server = get_test_server(15);

        let response = server
            .get(endpoints::LIST)
            .add_query_param("search", "BRASS")
            .await;

        response.assert_status_ok();
        let want: Vec<_> = [3, 6, 9, 12, 15]
            .iter()
            .map(|i| format!("Lamp #{i}"))
            .collect();
        assert_eq!(titles(&response.json::<Vec<Transaction>>()), want);
    }

    #[tokio::test]
    async fn other_month_is_empty() {
        let server = get_test_server(3);

        let response = server
            .get(endpoints::LIST)
            .add_query_param("month", "June")
            .await;

        response.assert_status_ok();
        assert!(response.json::<Vec<Transaction>>().is_empty());
    }
}
