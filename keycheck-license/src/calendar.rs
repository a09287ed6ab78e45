//! Calendar helpers for check dates and trial expiry.

use chrono::{Days, Local, NaiveDate};

/// Format of the `checkDate` stamped into snapshots.
pub const CHECK_DATE_FORMAT: &str = "%Y%m%d";

/// Formats accepted for `trialExpiry`, tried in order.
const TRIAL_EXPIRY_FORMATS: [&str; 2] = ["%d-%m-%Y", "%Y-%m-%d"];

/// Returns today's local calendar date.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Formats a date as `YYYYMMDD`.
#[must_use]
pub fn format_check_date(date: NaiveDate) -> String {
    date.format(CHECK_DATE_FORMAT).to_string()
}

/// Parses a `YYYYMMDD` check date.
#[must_use]
pub fn parse_check_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CHECK_DATE_FORMAT).ok()
}

/// Parses a trial expiry date (`DD-MM-YYYY`, or `YYYY-MM-DD`).
#[must_use]
pub fn parse_trial_expiry(value: &str) -> Option<NaiveDate> {
    TRIAL_EXPIRY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
}

/// Returns the date `days` before `date`, saturating at the earliest date.
pub(crate) fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
