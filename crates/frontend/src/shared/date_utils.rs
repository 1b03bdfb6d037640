//! Utilities for date formatting
//!
//! Posting dates travel as ISO `YYYY-MM-DD` strings, the value format of
//! `<input type="date">`.
use chrono::{DateTime, Utc};

/// Format a timestamp as an ISO date (UTC)
/// Example: 2024-03-15T23:30:00Z -> "2024-03-15"
pub fn iso_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Today's date, the default posting date of a new batch
pub fn today_iso() -> String {
    iso_date(Utc::now())
}

/// Format ISO date string to DD.MM.YYYY format
/// Example: "2024-03-15" or "2024-03-15T14:02:26Z" -> "15.03.2024"
pub fn format_date(date_str: &str) -> String {
    let date_part = date_str.split('T').next().unwrap_or(date_str);
    if let Some((year, rest)) = date_part.split_once('-') {
        if let Some((month, day)) = rest.split_once('-') {
            return format!("{}.{}.{}", day, month, year);
        }
    }
    date_str.to_string()
}
