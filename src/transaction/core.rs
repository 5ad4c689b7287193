//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{SourceId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// A single e-commerce sale record.
///
/// Transactions are created by a bulk load from an external source and are
/// never updated or deleted afterwards.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID the record had in the source it was loaded from, if any.
    pub source_id: Option<SourceId>,
    /// The product name.
    pub title: String,
    /// A text description of the product.
    pub description: String,
    /// The listed price of the product.
    pub price: f64,
    /// The product category, e.g. "electronics".
    pub category: String,
    /// A URL to a picture of the product.
    pub image: Option<String>,
    /// When the sale happened, as an ISO 8601 date or date-time string.
    pub date_of_sale: String,
    /// Whether the item was sold.
    pub sold: bool,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(title: &str, price: f64, category: &str, date_of_sale: &str) -> NewTransaction {
        NewTransaction {
            source_id: None,
            title: title.to_owned(),
            description: String::new(),
            price,
            category: category.to_owned(),
            image: None,
            date_of_sale: date_of_sale.to_owned(),
            sold: false,
        }
    }
}

/// A builder for transactions that have not been stored yet.
///
/// # Examples
///
/// ```ignore
/// let new_transaction = Transaction::build("Mens Casual Slim Fit", 15.99, "men's clothing", "2022-03-27T20:29:54+05:30")
///     .description("The color could be slightly different between on the screen and in practice.")
///     .sold(true)
///     .source_id(Some(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The ID the record had in the source it was loaded from.
    ///
    /// The store enforces uniqueness on this field so that loading the same
    /// source twice does not duplicate records. `None` is never considered a
    /// duplicate.
    pub source_id: Option<SourceId>,
    /// The product name.
    pub title: String,
    /// A text description of the product.
    pub description: String,
    /// The listed price of the product.
    pub price: f64,
    /// The product category.
    pub category: String,
    /// A URL to a picture of the product.
    pub image: Option<String>,
    /// When the sale happened.
    pub date_of_sale: String,
    /// Whether the item was sold.
    pub sold: bool,
}

impl NewTransaction {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set whether the item was sold.
    pub fn sold(mut self, sold: bool) -> Self {
        self.sold = sold;
        self
    }

    /// Set the image URL for the transaction.
    pub fn image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// Set the source ID for the transaction.
    pub fn source_id(mut self, source_id: Option<SourceId>) -> Self {
        self.source_id = source_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The columns of the transaction table in the order [map_transaction_row] expects.
pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, source_id, title, description, price, category, image, date_of_sale, sold";

/// Create a new transaction in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateSourceId] if a transaction with the same source ID already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (source_id, title, description, price, category, image, date_of_sale, sold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                new_transaction.source_id,
                new_transaction.title,
                new_transaction.description,
                new_transaction.price,
                new_transaction.category,
                new_transaction.image,
                new_transaction.date_of_sale,
                new_transaction.sold,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateSourceId,
            error => error.into(),
        })?;

    Ok(transaction)
}

/// Store many transactions at once, skipping any whose source ID is
/// already in the database.
///
/// The insert runs in a single SQL transaction, so either every new record
/// is stored or none are.
///
/// Returns the number of transactions that were stored.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn insert_transactions(
    new_transactions: &[NewTransaction],
    connection: &Connection,
) -> Result<usize, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut inserted = 0;

    {
        let mut statement = sql_transaction.prepare(
            "INSERT INTO \"transaction\" (source_id, title, description, price, category, image, date_of_sale, sold)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(source_id) DO NOTHING",
        )?;

        for new_transaction in new_transactions {
            inserted += statement.execute((
                new_transaction.source_id,
                &new_transaction.title,
                &new_transaction.description,
                new_transaction.price,
                &new_transaction.category,
                &new_transaction.image,
                &new_transaction.date_of_sale,
                new_transaction.sold,
            ))?;
        }
    }

    sql_transaction.commit()?;

    Ok(inserted)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|count| count as u64)
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL,
                category TEXT NOT NULL,
                image TEXT,
                date_of_sale TEXT NOT NULL,
                sold INTEGER NOT NULL
                )",
        (),
    )?;

    // Every statistics query filters on the month characters of the sale date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_sale_month
            ON \"transaction\"(substr(date_of_sale, 6, 2));",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        source_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        category: row.get(5)?,
        image: row.get(6)?,
        date_of_sale: row.get(7)?,
        sold: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================
