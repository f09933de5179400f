//! Plain text rendering of transactions and reports for the terminal.
//!
//! Amounts are rounded to cents here and nowhere else.

use std::{collections::BTreeMap, fmt::Write, sync::OnceLock};

use numfmt::{Formatter, Precision};
use time::Month;

use crate::{
    DateRange, Transaction,
    report::{BalancePoint, RangeReport},
};

/// Format `number` as dollars and cents, e.g. "$1,234.50" or "-$3.00".
///
/// The amount is rounded to the nearest cent, halves away from zero.
pub fn format_currency(number: f64) -> String {
    let cents = (number.abs() * 100.0).round();
    let dollars = (cents / 100.0).trunc() as u64;
    let remainder = (cents % 100.0) as u64;
    let sign = if number < 0.0 && cents > 0.0 { "-" } else { "" };

    format!("{sign}${}.{remainder:02}", group_thousands(dollars))
}

/// Write `number` with a comma between each group of three digits.
fn group_thousands(number: u64) -> String {
    // numfmt switches to scientific notation from here on.
    const SCIENTIFIC_CUTOFF: u64 = 1_000_000_000_000;

    static GROUPING_FMT: OnceLock<Formatter> = OnceLock::new();

    let grouping_fmt = GROUPING_FMT.get_or_init(|| {
        Formatter::new()
            .separator(',')
            .expect("',' is a valid separator")
            .precision(Precision::Decimals(0))
    });

    match number {
        // Zero is hardcoded as "0" by numfmt, which is already what we want.
        0 => "0".to_owned(),
        n if n < SCIENTIFIC_CUTOFF => grouping_fmt.fmt_string(n as f64),
        n => format!("{},{:03}", group_thousands(n / 1000), n % 1000),
    }
}

/// The heading for a report on `month` of `year`, e.g. "--- 08-2024 Report ---".
pub fn monthly_report_title(year: i32, month: Month) -> String {
    format!("--- {:02}-{year} Report ---", month as u8)
}

/// The heading for a report on the whole of `year`.
pub fn yearly_summary_title(year: i32) -> String {
    format!("--- {year} Yearly Summary ---")
}

/// The heading for a report on an arbitrary range.
pub fn range_report_title(range: &DateRange) -> String {
    format!("--- Report from {} to {} ---", range.start(), range.end())
}

/// Render the totals of `report` under `title`.
pub fn render_report(title: &str, report: &RangeReport) -> String {
    format!(
        "\n{title}\nTotal Income: {}\nTotal Expenses: {}\nNet Savings: {}\n",
        format_currency(report.income),
        format_currency(report.expense),
        format_currency(report.net),
    )
}

/// Render `transactions` as a table with one row per transaction.
pub fn render_transactions(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_owned();
    }

    let mut table = String::new();
    let header = format!(
        "{:>5} | {:<10} | {:>12} | {:<14} | {:<24} | {}",
        "ID", "Date", "Amount", "Category", "Description", "Type"
    );
    let _ = writeln!(table, "{header}");
    let _ = writeln!(table, "{}", "-".repeat(header.len()));

    for transaction in transactions {
        let _ = writeln!(
            table,
            "{:>5} | {:<10} | {:>12} | {:<14} | {:<24} | {}",
            transaction.id,
            transaction.date.to_string(),
            format_currency(transaction.amount),
            transaction.category,
            transaction.description,
            transaction.kind,
        );
    }

    table
}

/// Render a single transaction with one field per line.
pub fn render_transaction(transaction: &Transaction) -> String {
    format!(
        "ID: {}\nDate: {}\nAmount: {}\nCategory: {}\nDescription: {}\nType: {}\n",
        transaction.id,
        transaction.date,
        format_currency(transaction.amount),
        transaction.category,
        transaction.description,
        transaction.kind,
    )
}

/// Render one line per category with its total.
pub fn render_category_totals(totals: &BTreeMap<String, f64>) -> String {
    if totals.is_empty() {
        return "No transactions found.\n".to_owned();
    }

    let width = totals.keys().map(|category| category.len()).max().unwrap_or(0);

    totals
        .iter()
        .map(|(category, total)| format!("{category:<width$}  {}\n", format_currency(*total)))
        .collect()
}

/// Render the twelve monthly expense totals of a year, January first.
pub fn render_monthly_series(series: &[f64; 12]) -> String {
    let mut month = Month::January;
    let mut text = String::new();

    for total in series {
        let _ = writeln!(text, "{:<9}  {}", month.to_string(), format_currency(*total));
        month = month.next();
    }

    text
}

/// Render the running balance at each date.
pub fn render_balance_series(points: &[BalancePoint]) -> String {
    if points.is_empty() {
        return "No transactions found.\n".to_owned();
    }

    points
        .iter()
        .map(|point| format!("{}  {}\n", point.date, format_currency(point.balance)))
        .collect()
}
