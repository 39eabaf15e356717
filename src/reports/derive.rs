// src/reports/derive.rs
//! Presentation-only values computed at projection time.

use chrono::{Datelike, NaiveDate};

pub const LONG_DATE: &str = "%B %-d, %Y";
pub const MONTH_YEAR: &str = "%B %Y";

/// Whole years between `dob` and `on`; `None` for a birth date in the future.
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> Option<i32> {
    if dob > on {
        return None;
    }
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    Some(years)
}

pub fn long_date(date: NaiveDate) -> String {
    date.format(LONG_DATE).to_string()
}

pub fn month_year(date: NaiveDate) -> String {
    date.format(MONTH_YEAR).to_string()
}

/// Uppercases the first letter of every whitespace-separated word.
pub fn ucwords(value: &str) -> String {
    value
        .split(' ')
        .map(ucfirst)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn ucfirst(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `calcium_oxalate` -> `Calcium oxalate`
pub fn humanize(value: &str) -> String {
    ucfirst(value.replace('_', " ").trim())
}
