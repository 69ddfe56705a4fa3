//! Date helpers used by views and forms

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

/// Long date, e.g. "March 15, 2025". Absent dates render as an empty string.
pub fn format_date<Tz: TimeZone>(date: Option<&DateTime<Tz>>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_default()
}

/// Short date with time, e.g. "Mar 15, 2025, 09:30"
pub fn format_date_time<Tz: TimeZone>(date: Option<&DateTime<Tz>>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.map(|date| date.format("%b %-d, %Y, %H:%M").to_string())
        .unwrap_or_default()
}

/// Whole years between a `YYYY-MM-DD` birth date and `today`.
///
/// `None` for blank or malformed input and for birth dates after `today`.
pub fn calculate_age(birth_date: &str, today: NaiveDate) -> Option<u32> {
    let birth_date = birth_date.trim();
    if birth_date.is_empty() {
        return None;
    }
    let birth = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").ok()?;
    today.years_since(birth)
}

pub fn is_same_day<Tz: TimeZone>(a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    a.date_naive() == b.date_naive()
}

pub fn is_today(date: &DateTime<Utc>) -> bool {
    is_same_day(date, &Utc::now())
}

/// Sunday on or before `day`
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

pub fn start_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

pub fn start_of_year(day: NaiveDate) -> NaiveDate {
    day.with_ordinal(1).unwrap_or(day)
}
