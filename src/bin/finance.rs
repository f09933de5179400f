use std::{
    env,
    error::Error,
    fs,
    io::{self},
    path::{Path, PathBuf},
    process::exit,
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month, OffsetDateTime};

use finance_tracker::{
    Account, Config, DateRange, Kind, PasswordHash, Transaction, TransactionId,
    account::{log_in, register},
    charts, config::DEFAULT_DB_PATH, logging::setup_logging, open_db, parse_date, parse_month,
    report, transaction, view,
};

/// Track personal income and expenses in a local SQLite database.
#[derive(Parser, Debug)]
#[command(name = "finance", version, about, long_about = None)]
struct Cli {
    /// File path to the application SQLite database.
    #[arg(long, env = "FINANCE_DB_PATH", default_value = DEFAULT_DB_PATH, global = true)]
    db_path: PathBuf,

    /// Append debug logs to this file.
    #[arg(long, env = "FINANCE_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Login {
    /// The account to act as. The password is read from `FINANCE_PASSWORD`
    /// or prompted for.
    #[arg(long, short)]
    username: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new account.
    Register {
        /// The name used to log in.
        #[arg(long, short)]
        username: String,
    },
    /// Record a new transaction.
    Add {
        #[command(flatten)]
        login: Login,
        /// Whether the money was earned or spent.
        #[arg(long, value_parser = kind_arg)]
        kind: Kind,
        /// The amount of money, always positive.
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        /// The date as YYYY-MM-DD, defaults to today.
        #[arg(long, value_parser = date_arg)]
        date: Option<Date>,
    },
    /// Change the fields of a transaction, fields that are not given keep
    /// their value.
    Edit {
        #[command(flatten)]
        login: Login,
        id: TransactionId,
        #[arg(long, value_parser = kind_arg)]
        kind: Option<Kind>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = date_arg)]
        date: Option<Date>,
    },
    /// Delete a transaction.
    Delete {
        #[command(flatten)]
        login: Login,
        id: TransactionId,
    },
    /// Show a single transaction.
    Show {
        #[command(flatten)]
        login: Login,
        id: TransactionId,
        #[arg(long)]
        json: bool,
    },
    /// List transactions, optionally limited to a date range.
    List {
        #[command(flatten)]
        login: Login,
        #[arg(long, value_parser = date_arg, requires = "to")]
        from: Option<Date>,
        #[arg(long, value_parser = date_arg, requires = "from")]
        to: Option<Date>,
        #[arg(long)]
        json: bool,
    },
    /// Summarise transactions.
    Report {
        #[command(flatten)]
        login: Login,
        /// Print the report as JSON.
        #[arg(long, global = true)]
        json: bool,
        #[command(subcommand)]
        report: ReportCommand,
    },
    /// Write a chart to a standalone HTML page.
    Chart {
        #[command(flatten)]
        login: Login,
        kind: ChartKind,
        /// Where to write the HTML page.
        #[arg(long, short)]
        output: PathBuf,
        /// The year for charts that cover a single year, defaults to this year.
        #[arg(long)]
        year: Option<i32>,
        /// The number of bins for the amount histogram, at most 1000.
        #[arg(long, default_value_t = 20)]
        bins: usize,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Income, expenses and net savings for one month.
    Month {
        year: i32,
        #[arg(value_parser = month_arg)]
        month: Month,
    },
    /// Income, expenses and net savings for one year.
    Year { year: i32 },
    /// Income, expenses and net savings between two dates, inclusive.
    Range {
        #[arg(value_parser = date_arg)]
        start: Date,
        #[arg(value_parser = date_arg)]
        end: Date,
    },
    /// Totals per category.
    Categories {
        #[arg(long, value_parser = kind_arg, default_value = "expense")]
        kind: Kind,
    },
    /// Expenses in each month of a year.
    Series { year: i32 },
    /// The running balance after each day with transactions.
    Balance,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ChartKind {
    MonthlyExpenses,
    IncomeVsExpenses,
    IncomeSources,
    CumulativeBalance,
    IncomeExpenseTrend,
    CategoryTrend,
    AmountHistogram,
    CategoryAmounts,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match Config::new(cli.db_path, cli.log_file, PasswordHash::DEFAULT_COST) {
        Ok(config) => config,
        Err(error) => {
            print_error(error);
            exit(1);
        }
    };

    setup_logging(config.log_file.as_deref())?;

    let connection = open_db(&config.db_path)?;

    if let Err(error) = run(cli.command, &config, &connection) {
        tracing::debug!("Command failed: {error}");
        let code = exit_code(error.as_ref());
        print_error(error);
        exit(code);
    }

    Ok(())
}

fn run(command: Command, config: &Config, connection: &Connection) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Register { username } => {
            let Some(password) = prompt_new_password()? else {
                return Ok(());
            };
            let account = register(&username, &password, config.password_cost, connection)?;
            println!("Registered {}.", account.username);
        }
        Command::Add {
            login,
            kind,
            amount,
            category,
            description,
            date,
        } => {
            let account = authenticate(&login, connection)?;
            let date = date.unwrap_or_else(today);
            let builder = Transaction::build(kind, amount, date, &category).description(&description);
            let transaction = transaction::create_transaction(account.id, builder, connection)?;
            println!("Added transaction {}.", transaction.id);
        }
        Command::Edit {
            login,
            id,
            kind,
            amount,
            category,
            description,
            date,
        } => {
            let account = authenticate(&login, connection)?;
            let current = transaction::get_transaction(account.id, id, connection)?;
            let builder = Transaction::build(
                kind.unwrap_or(current.kind),
                amount.unwrap_or(current.amount),
                date.unwrap_or(current.date),
                category.as_deref().unwrap_or(&current.category),
            )
            .description(description.as_deref().unwrap_or(&current.description));
            transaction::update_transaction(account.id, id, builder, connection)?;
            println!("Updated transaction {id}.");
        }
        Command::Delete { login, id } => {
            let account = authenticate(&login, connection)?;
            match transaction::delete_transaction(account.id, id, connection)? {
                0 => println!("There is no transaction with the ID {id}."),
                _ => println!("Deleted transaction {id}."),
            }
        }
        Command::Show { login, id, json } => {
            let account = authenticate(&login, connection)?;
            let transaction = transaction::get_transaction(account.id, id, connection)?;
            print_output(json, &transaction, view::render_transaction)?;
        }
        Command::List {
            login,
            from,
            to,
            json,
        } => {
            let account = authenticate(&login, connection)?;
            let transactions = match (from, to) {
                (Some(from), Some(to)) => transaction::list_transactions_in_range(
                    account.id,
                    DateRange::new(from, to)?,
                    connection,
                )?,
                _ => transaction::list_transactions(account.id, connection)?,
            };
            print_output(json, &transactions, |transactions| {
                view::render_transactions(transactions)
            })?;
        }
        Command::Report {
            login,
            json,
            report,
        } => {
            let account = authenticate(&login, connection)?;
            run_report(report, json, &account, connection)?;
        }
        Command::Chart {
            login,
            kind,
            output,
            year,
            bins,
        } => {
            let account = authenticate(&login, connection)?;
            let year = year.unwrap_or_else(|| today().year());
            let page = render_chart(kind, year, bins, &account, connection)?;
            fs::write(&output, page)?;
            println!("{}", chart_written_message(&output));
        }
    }

    Ok(())
}

fn run_report(
    command: ReportCommand,
    json: bool,
    account: &Account,
    connection: &Connection,
) -> Result<(), Box<dyn Error>> {
    match command {
        ReportCommand::Month { year, month } => {
            let summary = report::monthly_report(account.id, year, month, connection)?;
            let title = view::monthly_report_title(year, month);
            print_output(json, &summary, |summary| view::render_report(&title, summary))?;
        }
        ReportCommand::Year { year } => {
            let summary = report::yearly_summary(account.id, year, connection)?;
            let title = view::yearly_summary_title(year);
            print_output(json, &summary, |summary| view::render_report(&title, summary))?;
        }
        ReportCommand::Range { start, end } => {
            let summary = report::custom_range_report(account.id, start, end, connection)?;
            let title = view::range_report_title(&DateRange::new(start, end)?);
            print_output(json, &summary, |summary| view::render_report(&title, summary))?;
        }
        ReportCommand::Categories { kind } => {
            let totals = report::category_totals(account.id, kind, connection)?;
            print_output(json, &totals, view::render_category_totals)?;
        }
        ReportCommand::Series { year } => {
            let series = report::monthly_series(account.id, year, connection)?;
            print_output(json, &series, view::render_monthly_series)?;
        }
        ReportCommand::Balance => {
            let points = report::cumulative_balance_series(account.id, connection)?;
            print_output(json, &points, |points| view::render_balance_series(points))?;
        }
    }

    Ok(())
}

fn render_chart(
    kind: ChartKind,
    year: i32,
    bins: usize,
    account: &Account,
    connection: &Connection,
) -> Result<String, finance_tracker::Error> {
    let (title, chart) = match kind {
        ChartKind::MonthlyExpenses => (
            "Monthly Expenses",
            charts::monthly_expenses_chart(
                year,
                &report::monthly_series(account.id, year, connection)?,
            ),
        ),
        ChartKind::IncomeVsExpenses => (
            "Income vs. Expenses",
            charts::income_vs_expenses_chart(
                year,
                &report::monthly_income_expense_series(account.id, year, connection)?,
            ),
        ),
        ChartKind::IncomeSources => (
            "Income Sources",
            charts::category_distribution_chart(
                "Income Sources",
                &report::category_totals(account.id, Kind::Income, connection)?,
            ),
        ),
        ChartKind::CumulativeBalance => (
            "Cumulative Savings",
            charts::cumulative_balance_chart(&report::cumulative_balance_series(
                account.id, connection,
            )?),
        ),
        ChartKind::IncomeExpenseTrend => (
            "Income and Expenses Over Time",
            charts::income_expense_trend_chart(&report::daily_totals(account.id, connection)?),
        ),
        ChartKind::CategoryTrend => (
            "Spending Trend by Category",
            charts::category_trend_chart(&report::category_spending_trend(
                account.id, connection,
            )?),
        ),
        ChartKind::AmountHistogram => (
            "Transaction Amounts",
            charts::amount_histogram_chart(&report::amount_histogram(
                account.id, bins, connection,
            )?),
        ),
        ChartKind::CategoryAmounts => (
            "Transaction Amounts by Category",
            charts::category_amounts_chart(&report::category_expense_spread(
                account.id, connection,
            )?),
        ),
    };

    Ok(charts::render_chart_page(title, &chart))
}

/// Print `value` as pretty JSON, or as text with `render`.
fn print_output<T, F>(json: bool, value: &T, render: F) -> Result<(), serde_json::Error>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", render(value));
    }

    Ok(())
}

fn authenticate(login: &Login, connection: &Connection) -> Result<Account, Box<dyn Error>> {
    let password = match env::var("FINANCE_PASSWORD") {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password(format!("Password for {}: ", login.username))?,
    };

    let account = log_in(&login.username, &password, connection)?;
    tracing::debug!("Authenticated as account {}", account.id);

    Ok(account)
}

/// Ask for a new password twice.
///
/// Returns `None` if stdin was closed before both passwords were entered.
fn prompt_new_password() -> Result<Option<String>, io::Error> {
    loop {
        let first_password = match rpassword::prompt_password("Enter a new password: ") {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(error) => return Err(error),
        };

        let second_password = match rpassword::prompt_password("Enter the same password again: ")
        {
            Ok(string) => string,
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(error) => return Err(error),
        };

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        return Ok(Some(first_password));
    }
}

fn chart_written_message(output: &Path) -> String {
    format!("Wrote chart to {}", output.display())
}

/// Invalid input exits with 2 like a usage error, every other failure with 1.
fn exit_code(error: &(dyn Error + 'static)) -> i32 {
    match error.downcast_ref::<finance_tracker::Error>() {
        Some(error) if error.is_validation() => 2,
        _ => 1,
    }
}

fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

fn date_arg(text: &str) -> Result<Date, String> {
    parse_date(text).map_err(|error| error.to_string())
}

fn month_arg(text: &str) -> Result<Month, String> {
    parse_month(text).map_err(|error| error.to_string())
}

fn kind_arg(text: &str) -> Result<Kind, String> {
    text.parse().map_err(|error: finance_tracker::Error| error.to_string())
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
