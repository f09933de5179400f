//! Chart generation for reports.
//!
//! Each function turns the output of a [report](crate::report) function into
//! an ECharts configuration, and [render_chart_page] wraps a chart in a
//! standalone HTML page that can be opened in a browser:
//! - **Monthly Expenses**: bar chart of expenses per month of a year
//! - **Income vs. Expenses**: stacked bar chart per month of a year
//! - **Category Distribution**: pie chart of totals per category
//! - **Cumulative Savings**: running balance over time
//! - **Income and Expenses Over Time**: daily totals as two lines
//! - **Spending Trend by Category**: one line per expense category
//! - **Transaction Amounts**: histogram of transaction amounts
//! - **Transaction Amounts by Category**: box plot of expense amounts per category

use std::collections::{BTreeMap, BTreeSet};

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Boxplot, Line, Pie, Scatter, bar::Bar},
};
use maud::{DOCTYPE, PreEscaped, html};
use time::{Date, Month};

use crate::report::{
    AmountSpread, BalancePoint, CategoryTrend, DailyTotals, HistogramBin, RangeReport,
};

const ECHARTS_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// Bar chart of the expenses in each month of `year`.
pub fn monthly_expenses_chart(year: i32, series: &[f64; 12]) -> Chart {
    base_chart("Expenses by Month", &year.to_string())
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(month_labels()),
        )
        .y_axis(currency_axis())
        .series(Bar::new().name("Expenses").data(series.to_vec()))
}

/// Stacked bar chart of the income and expenses in each month of `year`.
pub fn income_vs_expenses_chart(year: i32, series: &[RangeReport; 12]) -> Chart {
    let income: Vec<f64> = series.iter().map(|month| month.income).collect();
    let expenses: Vec<f64> = series.iter().map(|month| month.expense).collect();

    base_chart("Monthly Income vs. Expenses", &year.to_string())
        .legend(Legend::new().top("bottom"))
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(month_labels()),
        )
        .y_axis(currency_axis())
        .series(
            Bar::new()
                .name("Income")
                .stack("Total")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(income),
        )
        .series(
            Bar::new()
                .name("Expenses")
                .stack("Total")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(expenses),
        )
}

/// Pie chart of how `totals` is split between categories.
pub fn category_distribution_chart(title: &str, totals: &BTreeMap<String, f64>) -> Chart {
    let data: Vec<(f64, &str)> = totals
        .iter()
        .map(|(category, total)| (*total, category.as_str()))
        .collect();

    Chart::new()
        .title(Title::new().text(title))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().top("bottom"))
        .series(Pie::new().name(title).radius("55%").data(data))
}

/// Line chart of the running balance over time.
pub fn cumulative_balance_chart(points: &[BalancePoint]) -> Chart {
    let labels: Vec<String> = points.iter().map(|point| point.date.to_string()).collect();
    let values: Vec<f64> = points.iter().map(|point| point.balance).collect();

    base_chart("Cumulative Savings Over Time", "Income minus expenses")
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(Line::new().name("Cumulative Savings").data(values))
}

/// Line chart of the daily income and expense totals.
pub fn income_expense_trend_chart(days: &[DailyTotals]) -> Chart {
    let labels: Vec<String> = days.iter().map(|day| day.date.to_string()).collect();
    let income: Vec<f64> = days.iter().map(|day| day.income).collect();
    let expenses: Vec<f64> = days.iter().map(|day| day.expense).collect();

    base_chart("Income and Expenses Over Time", "Daily totals")
        .legend(Legend::new().top("bottom"))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(Line::new().name("Income").data(income))
        .series(Line::new().name("Expenses").data(expenses))
}

/// Line chart with the daily spending of each expense category.
///
/// Every line shares the same date axis, days without spending in a
/// category are left as gaps.
pub fn category_trend_chart(trends: &[CategoryTrend]) -> Chart {
    let dates: BTreeSet<Date> = trends
        .iter()
        .flat_map(|trend| trend.points.iter().map(|(date, _)| *date))
        .collect();
    let labels: Vec<String> = dates.iter().map(Date::to_string).collect();

    let mut chart = base_chart("Spending Trend by Category Over Time", "Daily expenses")
        .legend(Legend::new().top("bottom"))
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis());

    for trend in trends {
        let values: Vec<Option<f64>> = dates
            .iter()
            .map(|date| {
                trend
                    .points
                    .iter()
                    .find(|(point_date, _)| point_date == date)
                    .map(|(_, amount)| *amount)
            })
            .collect();

        chart = chart.series(Line::new().name(trend.category.as_str()).data(values));
    }

    chart
}

/// Bar chart of how many transactions fall in each amount bucket.
pub fn amount_histogram_chart(bins: &[HistogramBin]) -> Chart {
    let labels: Vec<String> = bins
        .iter()
        .map(|bin| format!("{:.2}-{:.2}", bin.lower, bin.upper))
        .collect();
    let counts: Vec<f64> = bins.iter().map(|bin| bin.count as f64).collect();

    base_chart("Distribution of Transaction Amounts", "All transactions")
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value).name("Frequency"))
        .series(Bar::new().name("Transactions").data(counts))
}

/// Box plot of the expense amounts in each category, with outliers drawn as points.
pub fn category_amounts_chart(spreads: &[AmountSpread]) -> Chart {
    let labels: Vec<&str> = spreads.iter().map(|spread| spread.category.as_str()).collect();
    let boxes: Vec<Vec<f64>> = spreads
        .iter()
        .map(|spread| {
            vec![
                spread.lower_whisker,
                spread.lower_quartile,
                spread.median,
                spread.upper_quartile,
                spread.upper_whisker,
            ]
        })
        .collect();
    let outliers: Vec<Vec<f64>> = spreads
        .iter()
        .enumerate()
        .flat_map(|(index, spread)| {
            spread
                .outliers
                .iter()
                .map(move |amount| vec![index as f64, *amount])
        })
        .collect();

    Chart::new()
        .title(
            Title::new()
                .text("Transaction Amounts by Category")
                .subtext("Expenses"),
        )
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("10%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis().name("Transaction Amount"))
        .series(Boxplot::new().name("Amounts").data(boxes))
        .series(Scatter::new().name("Outliers").data(outliers))
}

/// Render a standalone HTML page that draws `chart` with ECharts.
pub fn render_chart_page(page_title: &str, chart: &Chart) -> String {
    let script = format!(
        r#"(function() {{
            const chart = echarts.init(document.getElementById("chart"));
            chart.setOption({chart});
            window.addEventListener('resize', chart.resize);
        }})();"#
    );

    html!(
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page_title) }
                script src=(ECHARTS_SCRIPT_URL) {}
            }
            body {
                div id="chart" style="width: 100%; height: 90vh;" {}
                script { (PreEscaped(script)) }
            }
        }
    )
    .into_string()
}

fn base_chart(title: &str, subtitle: &str) -> Chart {
    Chart::new()
        .title(Title::new().text(title).subtext(subtitle))
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("10%")
                .contain_label(true),
        )
}

fn month_labels() -> Vec<String> {
    let mut month = Month::January;

    (0..12)
        .map(|_| {
            let label = month.to_string()[..3].to_owned();
            month = month.next();
            label
        })
        .collect()
}

fn currency_axis() -> Axis {
    Axis::new()
        .type_(AxisType::Value)
        .axis_label(AxisLabel::new().formatter(currency_formatter()))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
