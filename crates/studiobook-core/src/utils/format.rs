use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};

use crate::models::EventDate;

/// Spreadsheet serial day of 1970-01-01
const SHEET_EPOCH_SERIAL: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Display format for all booking dates
const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Parse a raw sheet date into a sortable timestamp.
///
/// Accepts serial day numbers, `YYYY-MM-DD`, RFC 3339 timestamps (shown in
/// local time, which is how the sheet's midnight dates round-trip), naive
/// `YYYY-MM-DDTHH:MM:SS`, and `DD-MM-YYYY`. Zero and blank values are
/// treated as "no date".
pub fn parse_event_timestamp(value: &EventDate) -> Option<NaiveDateTime> {
    match value {
        EventDate::Serial(serial) => {
            if *serial == 0.0 || !serial.is_finite() {
                return None;
            }
            let millis = ((serial - SHEET_EPOCH_SERIAL) * MILLIS_PER_DAY).round() as i64;
            DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
        }
        EventDate::Text(text) => {
            let text = text.trim();
            if text.is_empty() || text == "0" {
                return None;
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                return date.and_hms_opt(0, 0, 0);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.with_timezone(&Local).naive_local());
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
                return Some(dt);
            }
            NaiveDate::parse_from_str(text, DISPLAY_DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        }
    }
}

/// Format a raw sheet date as `DD-MM-YYYY`, or an empty string when it
/// cannot be parsed
pub fn format_date_safe(value: &EventDate) -> String {
    parse_event_timestamp(value)
        .map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Human-readable age of a timestamp: "just now", "5m ago", "2h ago", "3d ago"
pub fn format_age(since: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - since).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
