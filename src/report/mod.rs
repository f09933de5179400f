//! Derived views over an account's transactions.
//!
//! The functions in [query] read transactions from the database and never
//! modify it. The pure grouping and summing they build on lives in
//! [aggregation] so it can be reused on transactions that are already in
//! memory.
//!
//! Amounts are summed as `f64` and never rounded here, rounding to cents is
//! left to the presentation layer.

pub mod aggregation;
pub mod query;

pub use aggregation::{
    AmountSpread, BalancePoint, CategoryTrend, DailyTotals, HistogramBin, RangeReport,
};
pub use query::{
    amount_histogram, category_expense_spread, category_spending_trend, category_totals,
    cumulative_balance_series, custom_range_report, daily_totals, monthly_income_expense_series,
    monthly_report, monthly_series, range_report, sum_by_kind_in_range, yearly_summary,
};
