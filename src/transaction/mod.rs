//! Transaction records and the endpoints that serve them.
//!
//! This module contains:
//! - The `Transaction` model and `NewTransaction` builder
//! - Database functions for storing, listing and searching transactions
//! - Route handlers for the transaction endpoints

mod core;
mod list_endpoint;
mod query;
mod transactions_endpoint;

pub use core::{
    NewTransaction, Transaction, count_transactions, create_transaction,
    create_transaction_table, get_transaction, insert_transactions,
};
pub use list_endpoint::{ListQuery, list_transactions};
pub use query::{get_transactions, search_transactions};
pub use transactions_endpoint::{TransactionsWithStatistics, get_transactions_with_statistics};

pub(crate) use query::{MONTH_CONDITION, month_param};
