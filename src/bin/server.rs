use std::{
    fs::OpenOptions,
    net::SocketAddr,
    path::PathBuf,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use sales_stats::{
    AppState, DEFAULT_SEED_URL, PaginationConfig, StatisticsConfig, build_router,
    graceful_shutdown, load_transactions_from_file, logging_middleware, seed_transactions,
};

/// The REST API server for sales_stats.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// The URL of the JSON feed loaded by `POST /api/initialize`.
    #[arg(long, env = "SEED_URL", default_value = DEFAULT_SEED_URL)]
    seed_url: String,

    /// A JSON file in the feed format to load into the database at start-up.
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// A JSON file with the categories, price ranges and sale amount policy
    /// used for statistics.
    #[arg(long)]
    statistics_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    let statistics_config = match &args.statistics_config {
        Some(path) => StatisticsConfig::from_json_file(path)
            .expect("Could not load the statistics config"),
        None => StatisticsConfig::default(),
    };

    let conn = Connection::open(&args.db_path).expect("Could not open database");
    let state = AppState::new(
        conn,
        statistics_config,
        PaginationConfig::default(),
        &args.seed_url,
    )
    .expect("Could not create app state");

    if let Some(data_file) = &args.data_file {
        let batch = load_transactions_from_file(data_file).expect("Could not read data file");
        let connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");
        let summary =
            seed_transactions(batch, &connection).expect("Could not import data file");
        tracing::info!(
            "Imported {} new transactions from {}",
            summary.inserted,
            data_file.display()
        );
    }

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("Server stopped unexpectedly");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file))
        .with_filter(filter::LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
