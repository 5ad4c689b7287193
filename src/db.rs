//! Sets up the application's database and runs blocking queries off the
//! async runtime.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{Error, transaction::create_transaction_table};

/// Create the tables and indexes for the domain models.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Run `query` on a blocking thread with the database lock held.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned,
/// [Error::TaskFailed] if the blocking task panics or is cancelled, or
/// whatever error `query` returns.
pub(crate) async fn run_query<T, F>(
    db_connection: &Arc<Mutex<Connection>>,
    query: F,
) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, Error> + Send + 'static,
{
    let db_connection = db_connection.clone();

    tokio::task::spawn_blocking(move || {
        let connection = db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        query(&connection)
    })
    .await
    .map_err(|error| {
        tracing::error!("database task did not finish: {error}");
        Error::TaskFailed(error.to_string())
    })?
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex, mpsc},
        thread,
        time::{Duration, Instant},
    };

    use rusqlite::Connection;

    use crate::{
        Error,
        transaction::{Transaction, count_transactions, create_transaction},
    };

    use super::{initialize, run_query};

    #[test]
    fn initialize_twice_succeeds() {
        let conn = Connection::open_in_memory().unwrap();

        initialize(&conn).unwrap();
        initialize(&conn).unwrap();

        assert_eq!(count_transactions(&conn), Ok(0));
    }

    #[tokio::test]
    async fn run_query_returns_query_result() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        create_transaction(Transaction::build("Kettle", 30.0, "home", "2023-01-02"), &conn)
            .unwrap();
        let db_connection = Arc::new(Mutex::new(conn));

        let got = run_query(&db_connection, count_transactions).await;

        assert_eq!(got, Ok(1));
    }

    #[tokio::test]
    async fn run_query_passes_errors_through() {
        let db_connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));

        let got: Result<(), Error> = run_query(&db_connection, |_| Err(Error::NotFound)).await;

        assert_eq!(got, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn run_query_waits_for_the_lock_off_the_runtime() {
        let db_connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = {
            let db_connection = db_connection.clone();
            thread::spawn(move || {
                let _guard = db_connection.lock().unwrap();
                locked_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(200));
            })
        };
        locked_rx.recv().unwrap();

        let (query_finished, timer_finished) = tokio::join!(
            run_query(&db_connection, |_| Ok(Instant::now())),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Instant::now()
            },
        );

        holder.join().unwrap();
        assert!(timer_finished < query_finished.unwrap());
    }

    #[tokio::test]
    async fn run_query_reports_poisoned_lock() {
        let db_connection = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        {
            let db_connection = db_connection.clone();
            let _ = thread::spawn(move || {
                let _guard = db_connection.lock().unwrap();
                panic!("poison the lock");
            })
            .join();
        }

        let got = run_query(&db_connection, |_| Ok(())).await;

        assert_eq!(got, Err(Error::DatabaseLockError));
    }
}
