//! Sets up the application's SQLite database.

use std::path::Path;

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{Error, account::create_account_table, transaction::create_transaction_table};

/// Open the SQLite database at `path`, creating the file and the tables if
/// they do not exist yet.
///
/// # Errors
/// Returns an [Error::SqlError] if the file cannot be opened or the tables
/// cannot be created.
pub fn open(path: &Path) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    initialize(&connection)?;

    tracing::debug!("Opened database at {path:?}");

    Ok(connection)
}

/// Prepare `connection` for use by the application.
///
/// Foreign key enforcement is a per-connection setting in SQLite, so this
/// must be called on every new connection. Creating the tables is idempotent.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables cannot be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
