//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AccountId, DateRange, Error, database_id::TransactionId, date_range::check_storable,
    transaction::Kind,
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The account the transaction belongs to.
    pub owner_id: AccountId,
    /// When the transaction happened.
    pub date: Date,
    /// The amount of money spent or earned, always greater than zero.
    pub amount: f64,
    /// A short label used to group transactions, e.g. "Groceries" or "Salary".
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Whether the money was earned or spent.
    pub kind: Kind,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(kind: Kind, amount: f64, date: Date, category: &str) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            date,
            category: category.to_owned(),
            description: String::new(),
        }
    }

    /// The amount with the sign it has on the balance, see [Kind::signed].
    pub fn signed_amount(&self) -> f64 {
        self.kind.signed(self.amount)
    }
}

/// The user editable fields of a [Transaction].
///
/// Used both to add a transaction and to replace all the fields of an
/// existing one. The fields are validated before anything is written to the
/// database.
///
/// # Examples
///
/// ```
/// use time::macros::date;
///
/// use finance_tracker::{Kind, Transaction};
///
/// let builder = Transaction::build(Kind::Expense, 45.99, date!(2025 - 01 - 15), "Coffee")
///     .description("Beans for the office");
///
/// assert_eq!(builder.description, "Beans for the office");
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the money was earned or spent.
    pub kind: Kind,

    /// The amount of money, must be greater than zero.
    ///
    /// The direction of the money is given by `kind`, so a $45.99 purchase
    /// is an expense with the amount `45.99`.
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// The label used to group the transaction in reports.
    pub category: String,

    /// A human-readable description of the transaction. Defaults to empty.
    pub description: String,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Check the fields and normalise the text fields.
    ///
    /// # Errors
    /// Returns a [Error::NonPositiveAmount] if the amount is not a finite
    /// number greater than zero, [Error::EmptyCategory] if the category
    /// is blank, or [Error::InvalidDate] if the date is before the year 1.
    pub fn validate(self) -> Result<Self, Error> {
        check_storable(self.date)?;

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::NonPositiveAmount(self.amount));
        }

        let category = self.category.trim();

        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(Self {
            category: category.to_owned(),
            description: self.description.trim().to_owned(),
            ..self
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, owner_id, date, amount, category, description, kind";

/// Create a new transaction for `owner_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] or [Error::EmptyCategory] if the builder is invalid,
/// - [Error::InvalidAccount] if `owner_id` does not refer to a registered account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    owner_id: AccountId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate()?;

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" (owner_id, date, amount, category, description, kind)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                owner_id.as_i64(),
                builder.date,
                builder.amount,
                builder.category,
                builder.description,
                builder.kind,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidAccount(owner_id),
            error => error.into(),
        })?;

    tracing::debug!(
        "Created transaction {} for account {owner_id}",
        transaction.id
    );

    Ok(transaction)
}

/// Retrieve the transaction `id` belonging to `owner_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    owner_id: AccountId,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE id = :id AND owner_id = :owner_id"
        ))?
        .query_row(
            &[(":id", &id), (":owner_id", &owner_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all of the transactions belonging to `owner_id` in the order
/// they were added.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn list_transactions(
    owner_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE owner_id = :owner_id
             ORDER BY id ASC"
        ))?
        .query_map(&[(":owner_id", &owner_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Retrieve the transactions belonging to `owner_id` dated within `range`,
/// ordered by date and then by the order they were added.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn list_transactions_in_range(
    owner_id: AccountId,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3
             ORDER BY date ASC, id ASC"
        ))?
        .query_map(
            (owner_id.as_i64(), range.start(), range.end()),
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Replace every user editable field of the transaction `id` belonging to
/// `owner_id` with the fields in `builder`.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] or [Error::EmptyCategory] if the builder is invalid,
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `owner_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    owner_id: AccountId,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let builder = builder.validate()?;

    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET date = ?1, amount = ?2, category = ?3, description = ?4, kind = ?5
             WHERE id = ?6 AND owner_id = ?7
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.date,
                builder.amount,
                builder.category,
                builder.description,
                builder.kind,
                id,
                owner_id.as_i64(),
            ),
            map_transaction_row,
        )?;

    tracing::debug!("Updated transaction {id} for account {owner_id}");

    Ok(transaction)
}

/// Delete the transaction `id` belonging to `owner_id`.
///
/// Deleting a transaction that does not exist is not an error, so this can
/// safely be called more than once.
///
/// # Returns
/// The number of deleted rows, either 0 or 1.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transaction(
    owner_id: AccountId,
    id: TransactionId,
    connection: &Connection,
) -> Result<usize, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND owner_id = ?2",
        (id, owner_id.as_i64()),
    )?;

    tracing::debug!("Deleting transaction {id} for account {owner_id} affected {rows_affected} row(s)");

    Ok(rows_affected)
}

/// Get the number of transactions belonging to `owner_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(owner_id: AccountId, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE owner_id = ?1",
            (owner_id.as_i64(),),
            |row| row.get(0),
        )
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
                owner_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                amount REAL NOT NULL CHECK (amount > 0),
                category TEXT NOT NULL,
                description TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                FOREIGN KEY(owner_id) REFERENCES account(id)
                )",
        (),
    )?;

    // Every query is scoped to an owner and most filter on dates.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_owner_date ON \"transaction\"(owner_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let owner_id = AccountId::new(row.get(1)?);
    let date = row.get(2)?;
    let amount = row.get(3)?;
    let category = row.get(4)?;
    let description = row.get(5)?;
    let kind = row.get(6)?;

    Ok(Transaction {
        id,
        owner_id,
        date,
        amount,
        category,
        description,
        kind,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{Date, Month, macros::date};

    use crate::{
        AccountId, DateRange, Error, PasswordHash,
        account::create_account,
        initialize_db,
        transaction::{
            Kind, Transaction, count_transactions, create_transaction, delete_transaction,
            get_transaction, list_transactions, list_transactions_in_range, update_transaction,
        },
    };

    fn get_test_connection() -> (Connection, AccountId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();
        let account = create_account("alice", PasswordHash::new_unchecked("hunter2"), &conn)
            .expect("Could not create test account");

        (conn, account.id)
    }

    #[test]
    fn create_then_get_round_trips() {
        let (conn, owner_id) = get_test_connection();
        let builder = Transaction::build(Kind::Expense, 12.3, date!(2025 - 10 - 05), "Food")
            .description("Lunch");

        let created = create_transaction(owner_id, builder, &conn).unwrap();
        let fetched = get_transaction(owner_id, created.id, &conn).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.owner_id, owner_id);
        assert_eq!(fetched.date, date!(2025 - 10 - 05));
        assert_eq!(fetched.amount, 12.3);
        assert_eq!(fetched.category, "Food");
        assert_eq!(fetched.description, "Lunch");
        assert_eq!(fetched.kind, Kind::Expense);
    }

    #[test]
    fn create_trims_text_fields() {
        let (conn, owner_id) = get_test_connection();
        let builder = Transaction::build(Kind::Income, 1.0, date!(2025 - 10 - 05), "  Salary ")
            .description(" October ");

        let created = create_transaction(owner_id, builder, &conn).unwrap();

        assert_eq!(created.category, "Salary");
        assert_eq!(created.description, "October");
    }

    #[test]
    fn create_fails_on_invalid_owner() {
        let (conn, _) = get_test_connection();
        let owner_id = AccountId::new(42);

        let result = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidAccount(owner_id)));
    }

    #[test]
    fn create_rejects_invalid_fields_without_writing() {
        let (conn, owner_id) = get_test_connection();
        let day = date!(2025 - 10 - 05);
        let before_year_one = Date::from_calendar_date(-2, Month::June, 1).unwrap();

        let cases = [
            (
                Transaction::build(Kind::Expense, 0.0, day, "Food"),
                Error::NonPositiveAmount(0.0),
            ),
            (
                Transaction::build(Kind::Expense, -5.0, day, "Food"),
                Error::NonPositiveAmount(-5.0),
            ),
            (
                Transaction::build(Kind::Expense, f64::INFINITY, day, "Food"),
                Error::NonPositiveAmount(f64::INFINITY),
            ),
            (
                Transaction::build(Kind::Expense, 5.0, day, "   "),
                Error::EmptyCategory,
            ),
            (
                Transaction::build(Kind::Income, 10.0, before_year_one, "Gifts"),
                Error::InvalidDate(before_year_one.to_string()),
            ),
        ];

        for (builder, want) in cases {
            assert_eq!(create_transaction(owner_id, builder, &conn), Err(want));
        }

        assert_eq!(count_transactions(owner_id, &conn).unwrap(), 0);
    }

    #[test]
    fn get_fails_for_missing_id() {
        let (conn, owner_id) = get_test_connection();

        assert_eq!(get_transaction(owner_id, 1, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_fails_for_other_owner() {
        let (conn, owner_id) = get_test_connection();
        let other = create_account("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        let transaction = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_transaction(other.id, transaction.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_returns_owner_transactions_in_insertion_order() {
        let (conn, owner_id) = get_test_connection();
        let other = create_account("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        let later = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();
        create_transaction(
            other.id,
            Transaction::build(Kind::Expense, 2.0, date!(2025 - 10 - 04), "Food"),
            &conn,
        )
        .unwrap();
        let earlier = create_transaction(
            owner_id,
            Transaction::build(Kind::Income, 3.0, date!(2025 - 10 - 01), "Salary"),
            &conn,
        )
        .unwrap();

        let transactions = list_transactions(owner_id, &conn).unwrap();

        assert_eq!(transactions, vec![later, earlier]);
    }

    #[test]
    fn list_returns_empty_list_for_new_owner() {
        let (conn, owner_id) = get_test_connection();

        assert_eq!(list_transactions(owner_id, &conn).unwrap(), vec![]);
    }

    #[test]
    fn list_in_range_filters_and_sorts_by_date() {
        let (conn, owner_id) = get_test_connection();
        for (amount, date) in [
            (1.0, date!(2024 - 03 - 31)),
            (2.0, date!(2024 - 04 - 15)),
            (3.0, date!(2024 - 04 - 01)),
            (4.0, date!(2024 - 04 - 30)),
            (5.0, date!(2024 - 05 - 01)),
        ] {
            create_transaction(
                owner_id,
                Transaction::build(Kind::Expense, amount, date, "Food"),
                &conn,
            )
            .unwrap();
        }
        let range = DateRange::new(date!(2024 - 04 - 01), date!(2024 - 04 - 30)).unwrap();

        let amounts: Vec<f64> = list_transactions_in_range(owner_id, range, &conn)
            .unwrap()
            .iter()
            .map(|transaction| transaction.amount)
            .collect();

        assert_eq!(amounts, vec![3.0, 2.0, 4.0]);
    }

    #[test]
    fn update_replaces_all_fields() {
        let (conn, owner_id) = get_test_connection();
        let created = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            owner_id,
            created.id,
            Transaction::build(Kind::Income, 99.5, date!(2025 - 09 - 01), "Refund")
                .description("Returned shoes"),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.kind, Kind::Income);
        assert_eq!(updated.amount, 99.5);
        assert_eq!(updated.date, date!(2025 - 09 - 01));
        assert_eq!(updated.category, "Refund");
        assert_eq!(updated.description, "Returned shoes");
        assert_eq!(get_transaction(owner_id, created.id, &conn), Ok(updated));
    }

    #[test]
    fn update_fails_for_missing_or_foreign_transaction() {
        let (conn, owner_id) = get_test_connection();
        let other = create_account("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        let created = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();
        let builder = Transaction::build(Kind::Expense, 2.0, date!(2025 - 10 - 05), "Food");

        assert_eq!(
            update_transaction(owner_id, created.id + 1, builder.clone(), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            update_transaction(other.id, created.id, builder, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(get_transaction(owner_id, created.id, &conn), Ok(created));
    }

    #[test]
    fn update_rejects_invalid_fields_without_writing() {
        let (conn, owner_id) = get_test_connection();
        let created = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();

        let result = update_transaction(
            owner_id,
            created.id,
            Transaction::build(Kind::Expense, -1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        );

        assert_eq!(result, Err(Error::NonPositiveAmount(-1.0)));
        assert_eq!(get_transaction(owner_id, created.id, &conn), Ok(created));
    }

    #[test]
    fn delete_is_idempotent() {
        let (conn, owner_id) = get_test_connection();
        let created = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(owner_id, created.id, &conn), Ok(1));
        assert_eq!(delete_transaction(owner_id, created.id, &conn), Ok(0));
        assert_eq!(
            get_transaction(owner_id, created.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_ignores_other_owners_transactions() {
        let (conn, owner_id) = get_test_connection();
        let other = create_account("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        let created = create_transaction(
            owner_id,
            Transaction::build(Kind::Expense, 1.0, date!(2025 - 10 - 05), "Food"),
            &conn,
        )
        .unwrap();

        assert_eq!(delete_transaction(other.id, created.id, &conn), Ok(0));
        assert_eq!(count_transactions(owner_id, &conn), Ok(1));
    }

    #[test]
    fn deleting_account_does_not_remove_its_transactions() {
        let (conn, owner_id) = get_test_connection();
        create_transaction(
            owner_id,
            Transaction::build(Kind::Income, 100.0, date!(2025 - 10 - 05), "Salary"),
            &conn,
        )
        .unwrap();

        let result = conn.execute("DELETE FROM account WHERE id = ?1", (owner_id.as_i64(),));

        assert!(
            matches!(
                result,
                Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error {
                        extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                        ..
                    },
                    _
                ))
            ),
            "want a foreign key error, got {result:?}"
        );
        assert_eq!(count_transactions(owner_id, &conn), Ok(1));
    }

    #[test]
    fn get_count() {
        let (conn, owner_id) = get_test_connection();
        let today = date!(2025 - 10 - 05);
        let want_count = 20;
        for i in 1..=want_count {
            create_transaction(
                owner_id,
                Transaction::build(Kind::Expense, i as f64, today, "Food"),
                &conn,
            )
            .expect("Could not create transaction");
        }

        let got_count = count_transactions(owner_id, &conn).expect("Could not get count");

        assert_eq!(want_count, got_count);
    }
}
