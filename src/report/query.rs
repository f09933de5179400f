//! Reports computed from an account's stored transactions.
//!
//! None of these functions modify the database.

use std::collections::BTreeMap;

use rusqlite::Connection;
use time::{Date, Month};

use crate::{
    AccountId, DateRange, Error, Kind,
    report::aggregation::{
        AmountSpread, BalancePoint, CategoryTrend, DailyTotals, HistogramBin, MAX_HISTOGRAM_BINS,
        RangeReport, build_histogram, group_by_day, group_expenses_by_category_and_day,
        running_balances, spread_expenses_by_category, sum_by_category, sum_by_month,
    },
    transaction::{list_transactions, list_transactions_in_range},
};

/// Sum the amounts of `owner_id`'s transactions of `kind` dated between
/// `start` and `end`, inclusive.
///
/// Returns zero if there are no matching transactions, including when
/// `start` is after `end`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn sum_by_kind_in_range(
    owner_id: AccountId,
    kind: Kind,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
             WHERE owner_id = ?1 AND kind = ?2 AND date BETWEEN ?3 AND ?4",
        )?
        .query_row((owner_id.as_i64(), kind, start, end), |row| row.get(0))
        .map_err(|error| error.into())
}

/// The income, expenses and net savings of `owner_id` within `range`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn range_report(
    owner_id: AccountId,
    range: DateRange,
    connection: &Connection,
) -> Result<RangeReport, Error> {
    let income = sum_by_kind_in_range(
        owner_id,
        Kind::Income,
        range.start(),
        range.end(),
        connection,
    )?;
    let expense = sum_by_kind_in_range(
        owner_id,
        Kind::Expense,
        range.start(),
        range.end(),
        connection,
    )?;

    Ok(RangeReport::new(income, expense))
}

/// The income, expenses and net savings of `owner_id` for `month` of `year`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if `year` is outside the supported range of dates,
/// - or [Error::SqlError] there is some SQL error.
pub fn monthly_report(
    owner_id: AccountId,
    year: i32,
    month: Month,
    connection: &Connection,
) -> Result<RangeReport, Error> {
    range_report(owner_id, DateRange::month(year, month)?, connection)
}

/// The income, expenses and net savings of `owner_id` for the calendar `year`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if `year` is outside the supported range of dates,
/// - or [Error::SqlError] there is some SQL error.
pub fn yearly_summary(
    owner_id: AccountId,
    year: i32,
    connection: &Connection,
) -> Result<RangeReport, Error> {
    range_report(owner_id, DateRange::year(year)?, connection)
}

/// The income, expenses and net savings of `owner_id` from `start` to `end`, inclusive.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidRange] if `start` is after `end`,
/// - or [Error::SqlError] there is some SQL error.
pub fn custom_range_report(
    owner_id: AccountId,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<RangeReport, Error> {
    range_report(owner_id, DateRange::new(start, end)?, connection)
}

/// The total expenses of `owner_id` for each month of `year`, January first.
///
/// Months without expenses are zero.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if `year` is outside the supported range of dates,
/// - or [Error::SqlError] there is some SQL error.
pub fn monthly_series(
    owner_id: AccountId,
    year: i32,
    connection: &Connection,
) -> Result<[f64; 12], Error> {
    let months = monthly_income_expense_series(owner_id, year, connection)?;

    Ok(months.map(|month| month.expense))
}

/// The income, expenses and net savings of `owner_id` for each month of
/// `year`, January first.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidDate] if `year` is outside the supported range of dates,
/// - or [Error::SqlError] there is some SQL error.
pub fn monthly_income_expense_series(
    owner_id: AccountId,
    year: i32,
    connection: &Connection,
) -> Result<[RangeReport; 12], Error> {
    let transactions = list_transactions_in_range(owner_id, DateRange::year(year)?, connection)?;

    Ok(sum_by_month(&transactions, year))
}

/// The total amount of `owner_id`'s transactions of `kind` for each category.
///
/// # Returns
/// One entry per category seen for `kind`, ordered by category label.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn category_totals(
    owner_id: AccountId,
    kind: Kind,
    connection: &Connection,
) -> Result<BTreeMap<String, f64>, Error> {
    let transactions = list_transactions(owner_id, connection)?;

    Ok(sum_by_category(&transactions, kind))
}

/// The spread of `owner_id`'s expense amounts in each category, see [AmountSpread].
///
/// # Returns
/// One spread per expense category, ordered by category label.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn category_expense_spread(
    owner_id: AccountId,
    connection: &Connection,
) -> Result<Vec<AmountSpread>, Error> {
    let transactions = list_transactions(owner_id, connection)?;

    Ok(spread_expenses_by_category(&transactions))
}

/// The running balance of `owner_id` at the end of each day with
/// transactions, oldest first.
///
/// Income counts as positive and expenses as negative.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn cumulative_balance_series(
    owner_id: AccountId,
    connection: &Connection,
) -> Result<Vec<BalancePoint>, Error> {
    let transactions = list_transactions(owner_id, connection)?;

    Ok(running_balances(&transactions))
}

/// The income and expense totals of `owner_id` for each day with
/// transactions, oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn daily_totals(owner_id: AccountId, connection: &Connection) -> Result<Vec<DailyTotals>, Error> {
    let transactions = list_transactions(owner_id, connection)?;

    Ok(group_by_day(&transactions))
}

/// The daily spending of `owner_id` in each expense category.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn category_spending_trend(
    owner_id: AccountId,
    connection: &Connection,
) -> Result<Vec<CategoryTrend>, Error> {
    let transactions = list_transactions(owner_id, connection)?;

    Ok(group_expenses_by_category_and_day(&transactions))
}

/// The distribution of the amounts of all of `owner_id`'s transactions in
/// `bins` equal width buckets.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBinCount] if `bins` is zero or more than [MAX_HISTOGRAM_BINS],
/// - or [Error::SqlError] there is some SQL error.
pub fn amount_histogram(
    owner_id: AccountId,
    bins: usize,
    connection: &Connection,
) -> Result<Vec<HistogramBin>, Error> {
    if bins == 0 || bins > MAX_HISTOGRAM_BINS {
        return Err(Error::InvalidBinCount);
    }

    let amounts: Vec<f64> = list_transactions(owner_id, connection)?
        .iter()
        .map(|transaction| transaction.amount)
        .collect();

    build_histogram(&amounts, bins)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Date, Month, macros::date};

    use crate::{
        AccountId, Error, Kind, PasswordHash, Transaction,
        account::create_account,
        initialize_db,
        report::{BalancePoint, RangeReport},
        transaction::{create_transaction, delete_transaction, list_transactions},
    };

    use super::{
        amount_histogram, category_expense_spread, category_spending_trend, category_totals,
        cumulative_balance_series, custom_range_report, daily_totals, monthly_income_expense_series, monthly_report,
        monthly_series, sum_by_kind_in_range, yearly_summary,
    };

    fn get_test_connection() -> (Connection, AccountId) {
        let conn = Connection::open_in_memory().unwrap();
        initialize_db(&conn).unwrap();
        let account = create_account("alice", PasswordHash::new_unchecked("hunter2"), &conn)
            .expect("Could not create test account");

        (conn, account.id)
    }

    fn add(conn: &Connection, owner_id: AccountId, kind: Kind, amount: f64, date: Date, category: &str) {
        create_transaction(owner_id, Transaction::build(kind, amount, date, category), conn)
            .expect("Could not create transaction");
    }

    #[test]
    fn sum_over_empty_store_is_zero() {
        let (conn, owner_id) = get_test_connection();

        for kind in [Kind::Income, Kind::Expense] {
            let sum = sum_by_kind_in_range(
                owner_id,
                kind,
                date!(2000 - 01 - 01),
                date!(2099 - 12 - 31),
                &conn,
            )
            .unwrap();

            assert_eq!(sum, 0.0);
        }
    }

    #[test]
    fn sum_includes_both_ends_of_range() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Expense, 1.0, date!(2024 - 02 - 29), "Food");
        add(&conn, owner_id, Kind::Expense, 2.0, date!(2024 - 03 - 01), "Food");
        add(&conn, owner_id, Kind::Expense, 4.0, date!(2024 - 03 - 31), "Food");
        add(&conn, owner_id, Kind::Expense, 8.0, date!(2024 - 04 - 01), "Food");
        add(&conn, owner_id, Kind::Income, 16.0, date!(2024 - 03 - 15), "Salary");

        let sum = sum_by_kind_in_range(
            owner_id,
            Kind::Expense,
            date!(2024 - 03 - 01),
            date!(2024 - 03 - 31),
            &conn,
        )
        .unwrap();

        assert_eq!(sum, 6.0);
    }

    #[test]
    fn sum_ignores_other_owners() {
        let (conn, owner_id) = get_test_connection();
        let other = create_account("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        add(&conn, other.id, Kind::Income, 100.0, date!(2024 - 03 - 15), "Salary");

        let sum = sum_by_kind_in_range(
            owner_id,
            Kind::Income,
            date!(2024 - 01 - 01),
            date!(2024 - 12 - 31),
            &conn,
        )
        .unwrap();

        assert_eq!(sum, 0.0);
    }

    #[test]
    fn monthly_report_sums_income_and_expenses() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Expense, 50.0, date!(2024 - 08 - 05), "Food");
        add(&conn, owner_id, Kind::Income, 200.0, date!(2024 - 08 - 10), "Salary");
        add(&conn, owner_id, Kind::Income, 999.0, date!(2024 - 09 - 01), "Salary");

        let report = monthly_report(owner_id, 2024, Month::August, &conn).unwrap();

        assert_eq!(
            report,
            RangeReport {
                income: 200.0,
                expense: 50.0,
                net: 150.0
            }
        );
    }

    #[test]
    fn yearly_summary_covers_whole_year() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 01), "Salary");
        add(&conn, owner_id, Kind::Expense, 30.0, date!(2024 - 12 - 31), "Food");
        add(&conn, owner_id, Kind::Expense, 70.0, date!(2025 - 01 - 01), "Food");

        let report = yearly_summary(owner_id, 2024, &conn).unwrap();

        assert_eq!(report, RangeReport::new(100.0, 30.0));
    }

    #[test]
    fn custom_range_report_sums_inclusive_range() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 10), "Salary");
        add(&conn, owner_id, Kind::Expense, 30.0, date!(2024 - 01 - 20), "Food");
        add(&conn, owner_id, Kind::Expense, 70.0, date!(2024 - 01 - 21), "Food");

        let report =
            custom_range_report(owner_id, date!(2024 - 01 - 10), date!(2024 - 01 - 20), &conn)
                .unwrap();

        assert_eq!(report, RangeReport::new(100.0, 30.0));
    }

    #[test]
    fn custom_range_report_rejects_reversed_range() {
        let (conn, owner_id) = get_test_connection();
        let start = date!(2024 - 02 - 01);
        let end = date!(2024 - 01 - 01);

        let result = custom_range_report(owner_id, start, end, &conn);

        assert_eq!(result, Err(Error::InvalidRange { start, end }));
    }

    #[test]
    fn monthly_series_zero_fills_months() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Expense, 30.0, date!(2024 - 03 - 15), "Food");

        let series = monthly_series(owner_id, 2024, &conn).unwrap();

        let mut want = [0.0; 12];
        want[2] = 30.0;
        assert_eq!(series, want);
    }

    #[test]
    fn monthly_income_expense_series_splits_kinds() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Expense, 30.0, date!(2024 - 03 - 15), "Food");
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 03 - 01), "Salary");
        add(&conn, owner_id, Kind::Income, 100.0, date!(2023 - 03 - 01), "Salary");

        let series = monthly_income_expense_series(owner_id, 2024, &conn).unwrap();

        assert_eq!(series[2], RangeReport::new(100.0, 30.0));
        assert_eq!(series[0], RangeReport::default());
    }

    #[test]
    fn category_totals_groups_by_category() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 01), "Salary");
        add(&conn, owner_id, Kind::Income, 25.0, date!(2024 - 01 - 02), "Gifts");
        add(&conn, owner_id, Kind::Income, 50.0, date!(2024 - 02 - 01), "Salary");
        add(&conn, owner_id, Kind::Expense, 30.0, date!(2024 - 01 - 03), "Food");

        let totals = category_totals(owner_id, Kind::Income, &conn).unwrap();

        assert_eq!(
            totals.into_iter().collect::<Vec<_>>(),
            vec![("Gifts".to_owned(), 25.0), ("Salary".to_owned(), 150.0)]
        );
    }

    #[test]
    fn category_totals_is_empty_without_transactions() {
        let (conn, owner_id) = get_test_connection();

        assert!(category_totals(owner_id, Kind::Expense, &conn).unwrap().is_empty());
    }

    #[test]
    fn cumulative_balance_merges_same_day() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 01), "Salary");
        add(&conn, owner_id, Kind::Expense, 40.0, date!(2024 - 01 - 02), "Food");
        add(&conn, owner_id, Kind::Income, 10.0, date!(2024 - 01 - 02), "Gift");

        let series = cumulative_balance_series(owner_id, &conn).unwrap();

        assert_eq!(
            series,
            vec![
                BalancePoint {
                    date: date!(2024 - 01 - 01),
                    balance: 100.0
                },
                BalancePoint {
                    date: date!(2024 - 01 - 02),
                    balance: 70.0
                },
            ]
        );
    }

    #[test]
    fn daily_totals_and_trend_read_owner_transactions() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 01), "Salary");
        add(&conn, owner_id, Kind::Expense, 40.0, date!(2024 - 01 - 02), "Food");

        let days = daily_totals(owner_id, &conn).unwrap();
        let trends = category_spending_trend(owner_id, &conn).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[1].expense, 40.0);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].points, vec![(date!(2024 - 01 - 02), 40.0)]);
    }

    #[test]
    fn amount_histogram_counts_every_transaction() {
        let (conn, owner_id) = get_test_connection();
        for amount in [1.0, 2.0, 3.0, 4.0, 5.0] {
            add(&conn, owner_id, Kind::Expense, amount, date!(2024 - 01 - 01), "Food");
        }

        let histogram = amount_histogram(owner_id, 2, &conn).unwrap();

        assert_eq!(histogram.len(), 2);
        assert_eq!(histogram.iter().map(|bin| bin.count).sum::<usize>(), 5);
    }

    #[test]
    fn amount_histogram_rejects_zero_bins() {
        let (conn, owner_id) = get_test_connection();

        assert_eq!(amount_histogram(owner_id, 0, &conn), Err(Error::InvalidBinCount));
    }

    #[test]
    fn amount_histogram_rejects_huge_bin_counts() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Expense, 1.0, date!(2024 - 01 - 01), "Food");

        assert_eq!(
            amount_histogram(owner_id, usize::MAX, &conn),
            Err(Error::InvalidBinCount)
        );
    }

    #[test]
    fn category_expense_spread_only_uses_owner_expenses() {
        let (conn, owner_id) = get_test_connection();
        let other = create_account("bob", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        add(&conn, owner_id, Kind::Expense, 10.0, date!(2024 - 01 - 01), "Transport");
        add(&conn, owner_id, Kind::Expense, 4.0, date!(2024 - 01 - 02), "Food");
        add(&conn, owner_id, Kind::Expense, 8.0, date!(2024 - 01 - 03), "Food");
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 01), "Salary");
        add(&conn, other.id, Kind::Expense, 999.0, date!(2024 - 01 - 01), "Food");

        let spreads = category_expense_spread(owner_id, &conn).unwrap();

        let categories: Vec<&str> = spreads.iter().map(|spread| spread.category.as_str()).collect();
        assert_eq!(categories, vec!["Food", "Transport"]);
        assert_eq!(spreads[0].median, 6.0);
        assert_eq!(spreads[0].upper_whisker, 8.0);
        assert_eq!(spreads[1].median, 10.0);
    }

    #[test]
    fn reports_do_not_modify_the_store() {
        let (conn, owner_id) = get_test_connection();
        add(&conn, owner_id, Kind::Income, 100.0, date!(2024 - 01 - 01), "Salary");
        let before = list_transactions(owner_id, &conn).unwrap();

        monthly_report(owner_id, 2024, Month::January, &conn).unwrap();
        yearly_summary(owner_id, 2024, &conn).unwrap();
        cumulative_balance_series(owner_id, &conn).unwrap();
        category_totals(owner_id, Kind::Income, &conn).unwrap();

        assert_eq!(list_transactions(owner_id, &conn).unwrap(), before);
        assert_eq!(delete_transaction(owner_id, before[0].id, &conn), Ok(1));
    }
}
