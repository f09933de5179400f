use std::{error::Error, path::PathBuf, process::exit};

use clap::Parser;
use time::{Date, Duration, OffsetDateTime};

use finance_tracker::{
    Kind, PasswordHash, Transaction, ValidatedPassword,
    account::create_account,
    config::validate_db_path,
    open_db,
    transaction::create_transaction,
};

/// A utility for creating a test database for the finance tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: PathBuf,
}

/// Categories and amounts cycled through for the sample expenses.
const SAMPLE_EXPENSES: [(&str, f64, &str); 5] = [
    ("Groceries", 84.2, "Weekly shop"),
    ("Rent", 450.0, ""),
    ("Transport", 23.5, "Bus card top up"),
    ("Eating Out", 37.9, "Dinner"),
    ("Utilities", 61.15, "Power bill"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let output_path = args.output_path.as_path();

    if let Err(error) = validate_db_path(output_path) {
        eprintln!("{error}");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {}!", output_path.display());
        exit(1);
    }

    println!("Creating database at {}", output_path.display());
    let mut connection = open_db(output_path)?;

    println!("Creating test account...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let sql_transaction = connection.transaction()?;
    let account = create_account("test", password_hash, &sql_transaction)?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for months_ago in 0..12 {
        let month_start = months_before(today, months_ago);

        let salary = Transaction::build(Kind::Income, 2_500.0, month_start, "Salary")
            .description("Monthly pay");
        create_transaction(account.id, salary, &sql_transaction)?;
        count += 1;

        for (day, (category, amount, description)) in SAMPLE_EXPENSES.iter().enumerate() {
            let date = month_start + Duration::days(day as i64 * 5 + 2);
            let expense = Transaction::build(Kind::Expense, *amount, date, category)
                .description(description);
            create_transaction(account.id, expense, &sql_transaction)?;
            count += 1;
        }
    }

    sql_transaction.commit()?;

    println!("Created account \"test\" with the password \"test\" and {count} transactions.");
    println!("Success!");

    Ok(())
}

/// The first day of the month `months` months before `date`.
fn months_before(date: Date, months: u32) -> Date {
    let mut first = date.replace_day(1).unwrap_or(date);

    for _ in 0..months {
        first = first.previous_day().unwrap_or(first);
        first = first.replace_day(1).unwrap_or(first);
    }

    first
}
