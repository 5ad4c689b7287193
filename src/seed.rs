//! Loads transactions into the store from the upstream JSON feed or from a
//! local file in the same format.
//!
//! The feed is a JSON array of records like:
//!
//! ```json
//! {
//!   "id": 1,
//!   "title": "Fjallraven Foldsack No. 1 Backpack",
//!   "price": 329.85,
//!   "description": "Your perfect pack for everyday use",
//!   "category": "men's clothing",
//!   "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
//!   "sold": false,
//!   "dateOfSale": "2021-11-27T20:29:54+05:30"
//! }
//! ```

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::SourceId,
    db::run_query,
    transaction::{NewTransaction, Transaction, insert_transactions},
};

/// The feed the store is seeded from unless configured otherwise.
pub const DEFAULT_SEED_URL: &str = "https://s3.amazonaws.com/roxiler.com/product_transaction.json";

/// One record as it appears in the seed feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceTransaction {
    /// The ID of the record in the feed.
    #[serde(default)]
    pub id: Option<SourceId>,
    /// The product name.
    pub title: String,
    /// A text description of the product.
    #[serde(default)]
    pub description: String,
    /// The listed price of the product.
    pub price: f64,
    /// The product category.
    pub category: String,
    /// A URL to a picture of the product.
    #[serde(default)]
    pub image: Option<String>,
    /// Whether the item was sold.
    #[serde(default)]
    pub sold: bool,
    /// When the sale happened.
    pub date_of_sale: String,
}

impl From<SourceTransaction> for NewTransaction {
    fn from(source: SourceTransaction) -> Self {
        Transaction::build(
            &source.title,
            source.price,
            &source.category,
            &source.date_of_sale,
        )
        .description(&source.description)
        .sold(source.sold)
        .image(source.image)
        .source_id(source.id)
    }
}

/// The usable records from a feed and how many were malformed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    /// The records that could be read.
    pub records: Vec<SourceTransaction>,
    /// The number of records that were dropped because they were malformed.
    pub skipped: usize,
}

/// The outcome of a bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    /// The number of records in the feed.
    pub received: usize,
    /// The number of records that were newly stored.
    pub inserted: usize,
    /// The number of records dropped because they were malformed.
    pub skipped: usize,
}

/// Read a feed body into records.
///
/// Individual malformed records are logged and skipped.
///
/// # Errors
/// Returns [Error::InvalidSourceData] if `body` is not a JSON array.
pub fn parse_source_transactions(body: &[u8]) -> Result<SourceBatch, Error> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|error| Error::InvalidSourceData(error.to_string()))?;

    let mut batch = SourceBatch::default();

    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<SourceTransaction>(value) {
            Ok(record) => batch.records.push(record),
            Err(error) => {
                tracing::warn!("skipping malformed record at index {index}: {error}");
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}

/// Download and parse the feed at `url`.
///
/// # Errors
/// Returns [Error::UpstreamLoadFailure] if the feed cannot be reached or
/// responds with an error status, or [Error::InvalidSourceData] if the body
/// is not a JSON array.
pub async fn fetch_source_transactions(
    client: &reqwest::Client,
    url: &str,
) -> Result<SourceBatch, Error> {
    tracing::info!("fetching seed transactions from {url}");

    let body = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|error| Error::UpstreamLoadFailure(error.to_string()))?
        .bytes()
        .await
        .map_err(|error| Error::UpstreamLoadFailure(error.to_string()))?;

    parse_source_transactions(&body)
}

/// Read and parse a local file in the feed format.
///
/// # Errors
/// Returns [Error::Io] if the file cannot be read, or
/// [Error::InvalidSourceData] if it is not a JSON array.
pub fn load_transactions_from_file(path: &Path) -> Result<SourceBatch, Error> {
    let body =
        fs::read(path).map_err(|error| Error::Io(format!("{}: {error}", path.display())))?;

    parse_source_transactions(&body)
}

/// Store the records in `batch`, skipping any that are already stored.
///
/// # Errors
/// Returns [Error::SqlError] if the records cannot be stored, in which case
/// nothing from `batch` is stored.
pub fn seed_transactions(batch: SourceBatch, connection: &Connection) -> Result<SeedSummary, Error> {
    let received = batch.records.len() + batch.skipped;
    let new_transactions: Vec<NewTransaction> =
        batch.records.into_iter().map(NewTransaction::from).collect();

    let inserted = insert_transactions(&new_transactions, connection)?;

    tracing::info!(
        "seeded {inserted} of {received} transactions ({} malformed)",
        batch.skipped
    );

    Ok(SeedSummary {
        received,
        inserted,
        skipped: batch.skipped,
    })
}

/// The state needed to seed the store.
#[derive(Debug, Clone)]
pub struct SeedState {
    /// The database connection for storing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where to fetch the feed from.
    pub seed_url: String,
    /// The client used to fetch the feed.
    pub http_client: reqwest::Client,
}

impl FromRef<AppState> for SeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            seed_url: state.seed_url.clone(),
            http_client: state.http_client.clone(),
        }
    }
}

/// Load the seed feed into the store.
///
/// Records that are already stored are left as they are, so calling this
/// again does not create duplicates.
pub async fn initialize_store(State(state): State<SeedState>) -> Result<Json<SeedSummary>, Error> {
    let batch = fetch_source_transactions(&state.http_client, &state.seed_url).await?;

    run_query(&state.db_connection, move |connection| {
        seed_transactions(batch, connection)
    })
    .await
    .inspect_err(|error| tracing::error!("could not seed transactions: {error}"))
    .map(Json)
}
