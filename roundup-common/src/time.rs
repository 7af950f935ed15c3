use chrono::{Duration, NaiveDate, Utc};

/// Today's calendar date, UTC, as `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// First day of the month containing `date` (`YYYY-MM-DD` in, `YYYY-MM-DD` out).
pub fn first_day_of_month(date: &str) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    NaiveDate::from_ymd_opt(parsed.year(), parsed.month(), 1).map(|d| d.format("%Y-%m-%d").to_string())
}

use chrono::Datelike;

/// Current calendar month as `YYYY-MM`, used to index `Pledge::addresses`.
pub fn current_month() -> String {
    Utc::now().date_naive().format("%Y-%m").to_string()
}

/// Clamps `date` to strictly before `today`, falling back to the day
/// before `today` when `date` is on or after it (§4.9 "clamped strictly
/// less than today").
pub fn clamp_before(date: &str, today: &str) -> String {
    let today_parsed = match NaiveDate::parse_from_str(today, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => return date.to_string(),
    };
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) if parsed < today_parsed => date.to_string(),
        _ => (today_parsed - Duration::days(1)).format("%Y-%m-%d").to_string(),
    }
}
