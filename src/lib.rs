//! A personal finance tracker backed by a local SQLite database.
//!
//! Accounts record income and expense transactions, and the [report] module
//! derives monthly, yearly and custom range summaries, per-category totals
//! and running balances from them.
//!
//! Every operation takes the [rusqlite::Connection] it should use, the
//! caller owns the connection and decides how long it lives. Call
//! [initialize_db] once per connection before using it.

#![warn(missing_docs)]

use time::Date;

pub mod account;
pub mod charts;
pub mod config;
mod database_id;
mod date_range;
mod db;
pub mod logging;
mod password;
pub mod report;
pub mod transaction;
pub mod view;

pub use account::{Account, AccountId};
pub use config::Config;
pub use database_id::TransactionId;
pub use date_range::{DateRange, parse_date, parse_month};
pub use db::{initialize as initialize_db, open as open_db};
pub use password::{PasswordHash, ValidatedPassword};
pub use transaction::{Kind, Transaction, TransactionBuilder};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A date string was not a real calendar date in the format `YYYY-MM-DD`.
    #[error("\"{0}\" is not a valid date, expected a date like 2024-08-31")]
    InvalidDate(String),

    /// A month was neither a number from 1 to 12 nor a month name.
    #[error("\"{0}\" is not a valid month")]
    InvalidMonth(String),

    /// A transaction amount was zero, negative or not a finite number.
    ///
    /// The direction of money is given by [Kind], so amounts are always positive.
    #[error("the amount must be greater than zero, got {0}")]
    NonPositiveAmount(f64),

    /// A transaction kind was neither "income" nor "expense".
    #[error("\"{0}\" is not a transaction type, expected \"income\" or \"expense\"")]
    InvalidKind(String),

    /// A transaction was given a blank category.
    #[error("the category cannot be empty")]
    EmptyCategory,

    /// An account was registered with a blank username.
    #[error("the username cannot be empty")]
    EmptyUsername,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The start of a date range came after its end.
    #[error("the start date {start} is after the end date {end}")]
    InvalidRange {
        /// The first day of the requested range.
        start: Date,
        /// The last day of the requested range.
        end: Date,
    },

    /// A histogram was requested with zero bins or more than
    /// [MAX_HISTOGRAM_BINS](report::aggregation::MAX_HISTOGRAM_BINS).
    #[error(
        "a histogram needs between 1 and {} bins",
        report::aggregation::MAX_HISTOGRAM_BINS
    )]
    InvalidBinCount,

    /// The username is already taken by another account.
    #[error("the username \"{0}\" already exists")]
    DuplicateUsername(String),

    /// A transaction referred to an account that does not exist.
    #[error("there is no account with the ID {0}")]
    InvalidAccount(AccountId),

    /// The username and password combination did not match a registered account.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// Whether the error was caused by invalid input that was rejected before
    /// the database was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidDate(_)
                | Error::InvalidMonth(_)
                | Error::NonPositiveAmount(_)
                | Error::InvalidKind(_)
                | Error::EmptyCategory
                | Error::EmptyUsername
                | Error::TooWeak(_)
                | Error::InvalidRange { .. }
                | Error::InvalidBinCount
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
