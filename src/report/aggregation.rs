//! Transaction data aggregation.
//!
//! Pure functions that group already fetched transactions by month, day and
//! category, and calculate running balances and amount distributions.

use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use crate::{Error, Kind, Transaction};

/// The income, expense and net totals over some period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RangeReport {
    /// The sum of income amounts.
    pub income: f64,
    /// The sum of expense amounts.
    pub expense: f64,
    /// Income minus expenses.
    pub net: f64,
}

impl RangeReport {
    /// Create a report from the income and expense totals.
    pub fn new(income: f64, expense: f64) -> Self {
        Self {
            income,
            expense,
            net: income - expense,
        }
    }
}

/// The running balance at the end of a day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalancePoint {
    /// The day the balance applies to.
    pub date: Date,
    /// The net total of all transactions dated on or before `date`.
    pub balance: f64,
}

/// The income and expense totals for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyTotals {
    /// The day the totals apply to.
    pub date: Date,
    /// The sum of income amounts on `date`.
    pub income: f64,
    /// The sum of expense amounts on `date`.
    pub expense: f64,
}

/// The per-day spending in a single category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTrend {
    /// The category label.
    pub category: String,
    /// The total spent in the category on each day with spending, oldest first.
    pub points: Vec<(Date, f64)>,
}

/// The spread of the expense amounts in one category, drawn as a box plot.
///
/// The quartiles are interpolated linearly between the sorted amounts. The
/// whiskers reach the furthest amounts within 1.5 times the interquartile
/// range of the box, anything beyond them is an outlier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountSpread {
    /// The category label.
    pub category: String,
    /// The smallest amount that is not an outlier.
    pub lower_whisker: f64,
    /// The 25th percentile.
    pub lower_quartile: f64,
    /// The 50th percentile.
    pub median: f64,
    /// The 75th percentile.
    pub upper_quartile: f64,
    /// The largest amount that is not an outlier.
    pub upper_whisker: f64,
    /// The amounts outside the whiskers, smallest first.
    pub outliers: Vec<f64>,
}

/// One bucket of a histogram of transaction amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    /// The smallest amount that falls in the bin.
    pub lower: f64,
    /// The bin covers amounts less than `upper`, or up to and including
    /// `upper` for the last bin.
    pub upper: f64,
    /// How many transactions fall in the bin.
    pub count: usize,
}

/// Totals the transactions dated in `year` by calendar month.
///
/// # Returns
/// One report per month, January first. Months without transactions are all zeros.
pub fn sum_by_month(transactions: &[Transaction], year: i32) -> [RangeReport; 12] {
    let mut income = [0.0; 12];
    let mut expense = [0.0; 12];

    for transaction in transactions.iter().filter(|t| t.date.year() == year) {
        let index = transaction.date.month() as usize - 1;

        match transaction.kind {
            Kind::Income => income[index] += transaction.amount,
            Kind::Expense => expense[index] += transaction.amount,
        }
    }

    std::array::from_fn(|index| RangeReport::new(income[index], expense[index]))
}

/// Sums the amounts of the transactions of `kind` by category.
///
/// # Returns
/// A map from each category label seen for `kind` to its total, ordered by label.
pub fn sum_by_category(transactions: &[Transaction], kind: Kind) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();

    for transaction in transactions.iter().filter(|t| t.kind == kind) {
        *totals.entry(transaction.category.clone()).or_insert(0.0) += transaction.amount;
    }

    totals
}

/// Calculates the running balance, counting income as positive and expenses
/// as negative.
///
/// Transactions that share a date are merged into one point.
///
/// # Returns
/// One point per distinct date, in ascending date order.
pub fn running_balances(transactions: &[Transaction]) -> Vec<BalancePoint> {
    let mut net_by_date: BTreeMap<Date, f64> = BTreeMap::new();

    for transaction in transactions {
        *net_by_date.entry(transaction.date).or_insert(0.0) += transaction.signed_amount();
    }

    let mut balance = 0.0;

    net_by_date
        .into_iter()
        .map(|(date, net)| {
            balance += net;
            BalancePoint { date, balance }
        })
        .collect()
}

/// Totals income and expenses for each day with transactions.
///
/// # Returns
/// One entry per distinct date, in ascending date order.
pub fn group_by_day(transactions: &[Transaction]) -> Vec<DailyTotals> {
    let mut totals: BTreeMap<Date, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let (income, expense) = totals.entry(transaction.date).or_insert((0.0, 0.0));

        match transaction.kind {
            Kind::Income => *income += transaction.amount,
            Kind::Expense => *expense += transaction.amount,
        }
    }

    totals
        .into_iter()
        .map(|(date, (income, expense))| DailyTotals {
            date,
            income,
            expense,
        })
        .collect()
}

/// Groups expenses by category and then by day.
///
/// Income is ignored.
///
/// # Returns
/// One trend per expense category ordered by label, each with its points in
/// ascending date order.
pub fn group_expenses_by_category_and_day(transactions: &[Transaction]) -> Vec<CategoryTrend> {
    let mut by_category: BTreeMap<&str, BTreeMap<Date, f64>> = BTreeMap::new();

    for transaction in transactions.iter().filter(|t| t.kind == Kind::Expense) {
        *by_category
            .entry(transaction.category.as_str())
            .or_default()
            .entry(transaction.date)
            .or_insert(0.0) += transaction.amount;
    }

    by_category
        .into_iter()
        .map(|(category, totals)| CategoryTrend {
            category: category.to_owned(),
            points: totals.into_iter().collect(),
        })
        .collect()
}

/// Describes the spread of the expense amounts in each category.
///
/// Income is ignored.
///
/// # Returns
/// One spread per expense category, ordered by label.
pub fn spread_expenses_by_category(transactions: &[Transaction]) -> Vec<AmountSpread> {
    let mut by_category: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for transaction in transactions.iter().filter(|t| t.kind == Kind::Expense) {
        by_category
            .entry(transaction.category.as_str())
            .or_default()
            .push(transaction.amount);
    }

    by_category
        .into_iter()
        .map(|(category, mut amounts)| {
            amounts.sort_by(f64::total_cmp);
            spread_of_sorted(category, &amounts)
        })
        .collect()
}

/// `sorted` must be in ascending order and not empty.
fn spread_of_sorted(category: &str, sorted: &[f64]) -> AmountSpread {
    let lower_quartile = percentile_of_sorted(sorted, 0.25);
    let median = percentile_of_sorted(sorted, 0.5);
    let upper_quartile = percentile_of_sorted(sorted, 0.75);

    let reach = 1.5 * (upper_quartile - lower_quartile);
    let lower_fence = lower_quartile - reach;
    let upper_fence = upper_quartile + reach;

    let (inliers, outliers): (Vec<f64>, Vec<f64>) = sorted
        .iter()
        .partition(|amount| (lower_fence..=upper_fence).contains(*amount));

    AmountSpread {
        category: category.to_owned(),
        lower_whisker: inliers.first().copied().unwrap_or(lower_quartile),
        lower_quartile,
        median,
        upper_quartile,
        upper_whisker: inliers.last().copied().unwrap_or(upper_quartile),
        outliers,
    }
}

fn percentile_of_sorted(sorted: &[f64], fraction: f64) -> f64 {
    let rank = fraction * (sorted.len() - 1) as f64;
    let below = rank.floor() as usize;
    let above = rank.ceil() as usize;

    sorted[below] + (sorted[above] - sorted[below]) * (rank - below as f64)
}

/// The most bins a histogram may have.
pub const MAX_HISTOGRAM_BINS: usize = 1000;

/// Counts `amounts` into `bins` equal width buckets spanning the smallest to
/// the largest amount.
///
/// If every amount is the same, they are all counted in the first bin.
///
/// # Returns
/// No bins if `amounts` is empty, otherwise exactly `bins` bins.
///
/// # Errors
/// Returns [Error::InvalidBinCount] if `bins` is zero or more than
/// [MAX_HISTOGRAM_BINS].
pub fn build_histogram(amounts: &[f64], bins: usize) -> Result<Vec<HistogramBin>, Error> {
    if bins == 0 || bins > MAX_HISTOGRAM_BINS {
        return Err(Error::InvalidBinCount);
    }

    if amounts.is_empty() {
        return Ok(Vec::new());
    }

    let min = amounts.iter().copied().fold(f64::INFINITY, f64::min);
    let max = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|index| HistogramBin {
            lower: min + index as f64 * width,
            upper: if index + 1 == bins {
                max
            } else {
                min + (index + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for amount in amounts {
        let index = if width > 0.0 {
            (((amount - min) / width) as usize).min(bins - 1)
        } else {
            0
        };

        histogram[index].count += 1;
    }

    Ok(histogram)
}
