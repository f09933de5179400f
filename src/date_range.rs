//! Date parsing and inclusive date ranges used to bucket transactions.

use std::ops::RangeInclusive;

use serde::Serialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The years whose dates are stored as `YYYY-MM-DD` text that sorts in date order.
const STORABLE_YEARS: RangeInclusive<i32> = 1..=9999;

/// Parse an ISO 8601 calendar date such as `2024-08-31`.
///
/// The year must be exactly four digits without a sign, so `-0001-01-01`
/// and `+2024-01-01` are rejected along with the year `0000`.
///
/// # Errors
/// Returns [Error::InvalidDate] if the text is not in the `YYYY-MM-DD` format
/// or does not name a real day, e.g. `2024-13-40` or `2023-02-29`.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    let trimmed = text.trim();

    // `[year]` also accepts a leading sign.
    if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::InvalidDate(text.to_owned()));
    }

    Date::parse(trimmed, ISO_DATE)
        .ok()
        .filter(|date| STORABLE_YEARS.contains(&date.year()))
        .ok_or_else(|| Error::InvalidDate(text.to_owned()))
}

/// Check that `date` can be stored and compared as text.
///
/// # Errors
/// Returns [Error::InvalidDate] for dates before the year 1.
pub(crate) fn check_storable(date: Date) -> Result<Date, Error> {
    if STORABLE_YEARS.contains(&date.year()) {
        Ok(date)
    } else {
        Err(Error::InvalidDate(date.to_string()))
    }
}

/// Parse a month given as a number (`8`, `08`) or an English name (`aug`, `August`).
///
/// # Errors
/// Returns [Error::InvalidMonth] for anything else.
pub fn parse_month(text: &str) -> Result<Month, Error> {
    let trimmed = text.trim();

    if let Ok(number) = trimmed.parse::<u8>() {
        return Month::try_from(number).map_err(|_| Error::InvalidMonth(text.to_owned()));
    }

    let lowercase = trimmed.to_lowercase();
    let mut month = Month::January;

    for _ in 0..12 {
        let name = month.to_string().to_lowercase();

        if lowercase == name || (lowercase.len() == 3 && name.starts_with(&lowercase)) {
            return Ok(month);
        }

        month = month.next();
    }

    Err(Error::InvalidMonth(text.to_owned()))
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    /// Create the range `[start, end]`.
    ///
    /// A single day range where `start == end` is allowed.
    ///
    /// # Errors
    /// Returns [Error::InvalidRange] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// The range covering every day of `month` in `year`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if `year` is outside the supported range of dates.
    pub fn month(year: i32, month: Month) -> Result<Self, Error> {
        let start = first_day(year, month)?;
        let end = match month {
            Month::December => Date::from_calendar_date(year, Month::December, 31),
            _ => Date::from_calendar_date(year, month.next(), 1)
                .map(|first_of_next| first_of_next.previous_day().unwrap_or(first_of_next)),
        }
        .map_err(|_| Error::InvalidDate(format!("{year}-{:02}", month as u8)))?;

        Ok(Self { start, end })
    }

    /// The range from the first of January to the 31st of December of `year`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if `year` is outside the supported range of dates.
    pub fn year(year: i32) -> Result<Self, Error> {
        let start = first_day(year, Month::January)?;
        let end = Date::from_calendar_date(year, Month::December, 31)
            .map_err(|_| Error::InvalidDate(format!("{year}-12-31")))?;

        Ok(Self { start, end })
    }

    /// The first day in the range.
    pub fn start(&self) -> Date {
        self.start
    }

    /// The last day in the range.
    pub fn end(&self) -> Date {
        self.end
    }
}

fn first_day(year: i32, month: Month) -> Result<Date, Error> {
    Date::from_calendar_date(year, month, 1)
        .map_err(|_| Error::InvalidDate(format!("{year}-{:02}-01", month as u8)))
}
