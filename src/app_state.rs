//! Implements a struct that holds the state of the REST server.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig, statistics::StatisticsConfig};

/// How long to wait for the seed source before giving up.
const SEED_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The categories, price ranges and sale amount policy used for
    /// statistics.
    pub statistics_config: Arc<StatisticsConfig>,

    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,

    /// Where to fetch seed transactions from when the store is initialized.
    pub seed_url: String,

    /// The client used to fetch seed transactions.
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized, if
    /// `statistics_config` is invalid or if the HTTP client cannot be built.
    pub fn new(
        db_connection: Connection,
        statistics_config: StatisticsConfig,
        pagination_config: PaginationConfig,
        seed_url: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;
        statistics_config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(SEED_REQUEST_TIMEOUT)
            .build()
            .map_err(|error| Error::UpstreamLoadFailure(error.to_string()))?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            statistics_config: Arc::new(statistics_config),
            pagination_config,
            seed_url: seed_url.to_owned(),
            http_client,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        Error, PaginationConfig,
        statistics::{PriceRange, StatisticsConfig},
    };

    use super::AppState;

    #[test]
    fn new_initializes_database() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            StatisticsConfig::default(),
            PaginationConfig::default(),
            "http://localhost/seed.json",
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(state.seed_url, "http://localhost/seed.json");
    }

    #[test]
    fn new_rejects_invalid_statistics_config() {
        let config = StatisticsConfig {
            price_ranges: vec![PriceRange::bounded(0.0, 100.0)],
            ..Default::default()
        };

        let result = AppState::new(
            Connection::open_in_memory().unwrap(),
            config,
            PaginationConfig::default(),
            "http://localhost/seed.json",
        );

        assert!(matches!(result, Err(Error::InvalidStatisticsConfig(_))));
    }
}
