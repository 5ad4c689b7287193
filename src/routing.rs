//! Application router configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, endpoints,
    not_found::get_404_not_found,
    seed::initialize_store,
    statistics::{get_bar_chart, get_combined_data, get_pie_chart, get_statistics},
    transaction::{get_transactions_with_statistics, list_transactions},
};

/// Return a router with all the app's routes.
///
/// Every origin may call the API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_with_statistics),
        )
        .route(endpoints::LIST, get(list_transactions))
        .route(endpoints::BAR_CHART, get(get_bar_chart))
        .route(endpoints::PIE_CHART, get(get_pie_chart))
        .route(endpoints::COMBINED, get(get_combined_data))
        .route(endpoints::STATISTICS, get(get_statistics))
        .route(endpoints::INITIALIZE, post(initialize_store))
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
