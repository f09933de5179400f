//! Code for creating the account table, registering accounts and logging in.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash, ValidatedPassword};

/// A newtype wrapper for integer account IDs.
///
/// This helps disambiguate account IDs from transaction IDs, leading to better
/// compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(i64);

impl AccountId {
    /// Create a new account ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the account ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The account's ID in the application database.
    pub id: AccountId,
    /// The unique name used to log in.
    pub username: String,
    /// The account's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
}

/// Create the account table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Validate and hash `raw_password` and register a new account for `username`.
///
/// Leading and trailing whitespace is removed from `username`. `cost` is the
/// bcrypt cost, see [PasswordHash::new].
///
/// # Errors
///
/// This function will return a:
/// - [Error::EmptyUsername] if `username` is blank,
/// - [Error::TooWeak] if the password is too easy to guess,
/// - [Error::DuplicateUsername] if the username is already registered,
/// - [Error::HashingError] if the password could not be hashed,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn register(
    username: &str,
    raw_password: &str,
    cost: u32,
    connection: &Connection,
) -> Result<Account, Error> {
    let username = validate_username(username)?;
    let password = ValidatedPassword::new(raw_password, &[username])?;
    let password_hash = PasswordHash::new(password, cost)?;

    create_account(username, password_hash, connection)
}

/// Insert a new account with an already hashed password into the database.
///
/// # Errors
///
/// This function will return a:
/// - [Error::EmptyUsername] if `username` is blank,
/// - [Error::DuplicateUsername] if the username is already registered,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    username: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<Account, Error> {
    let username = validate_username(username)?;

    connection
        .execute(
            "INSERT INTO account (username, password_hash) VALUES (?1, ?2)",
            (username, password_hash.as_ref()),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateUsername(username.to_owned()),
            error => error.into(),
        })?;

    let id = AccountId::new(connection.last_insert_rowid());

    tracing::info!("Registered account {id} for \"{username}\"");

    Ok(Account {
        id,
        username: username.to_owned(),
        password_hash,
    })
}

/// Check `raw_password` against the stored hash of the account named `username`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidCredentials] if there is no such account or the password is wrong,
/// - [Error::HashingError] if the stored hash could not be checked,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn log_in(username: &str, raw_password: &str, connection: &Connection) -> Result<Account, Error> {
    let account = match get_account_by_username(username.trim(), connection) {
        Ok(account) => account,
        Err(Error::NotFound) => {
            tracing::info!("Log in attempt for unknown username \"{username}\"");
            return Err(Error::InvalidCredentials);
        }
        Err(error) => return Err(error),
    };

    if !account.password_hash.verify(raw_password)? {
        tracing::info!("Wrong password for account {}", account.id);
        return Err(Error::InvalidCredentials);
    }

    tracing::debug!("Account {} logged in", account.id);

    Ok(account)
}

/// Get the account from the database with an ID equal to `account_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `account_id` does not belong to a registered account.
/// - there was an error trying to access the store.
pub fn get_account_by_id(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, username, password_hash FROM account WHERE id = :id")?
        .query_row(&[(":id", &account_id.as_i64())], map_account_row)
        .map_err(|error| error.into())
}

/// Get the account from the database registered under `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered account.
/// - there was an error trying to access the store.
pub fn get_account_by_username(username: &str, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, username, password_hash FROM account WHERE username = :username")?
        .query_row(&[(":username", &username)], map_account_row)
        .map_err(|error| error.into())
}

/// Get the number of accounts in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn count_accounts(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM account;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn validate_username(username: &str) -> Result<&str, Error> {
    let username = username.trim();

    if username.is_empty() {
        return Err(Error::EmptyUsername);
    }

    Ok(username)
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = AccountId::new(row.get(0)?);
    let username = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(Account {
        id,
        username,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
