//! Timestamp and calendar helpers

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Get current UTC calendar date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Monday of the ISO week containing `day`
pub fn week_start_of(day: NaiveDate) -> NaiveDate {
    day - Days::new(u64::from(day.weekday().num_days_from_monday()))
}
