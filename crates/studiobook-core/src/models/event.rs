use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::format::{format_date_safe, parse_event_timestamp};

/// Raw `eventDate` value as the spreadsheet hands it over.
///
/// Kept verbatim so that the cached snapshot serializes exactly like the
/// fetched one; parsing happens only for sorting and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(untagged)]
pub enum EventDate {
    /// Spreadsheet serial day number (days since 1899-12-30)
    Serial(f64),
    /// ISO date, RFC 3339 timestamp, or `DD-MM-YYYY`
    Text(String),
}

impl EventDate {
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_event_timestamp(self)
    }
}

/// One studio booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, deserialize_with = "de_text")]
    pub event_id: String,
    #[serde(default)]
    pub event_date: Option<EventDate>,
    #[serde(default, deserialize_with = "de_text")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub event_type: String,
    #[serde(default, deserialize_with = "de_flag")]
    pub attended: bool,
}

impl EventRecord {
    /// Active bookings are the ones not yet marked attended
    pub fn is_active(&self) -> bool {
        !self.attended
    }

    pub fn formatted_date(&self) -> String {
        self.event_date
            .as_ref()
            .map(format_date_safe)
            .unwrap_or_default()
    }

    fn sort_key(&self) -> Option<NaiveDateTime> {
        self.event_date.as_ref().and_then(EventDate::timestamp)
    }
}

/// Reduce a fetched list to the active snapshot: unattended records only,
/// ascending by date. `sort_by` is stable, so equal dates keep their
/// fetched order; undated records go last.
pub fn active_snapshot(records: Vec<EventRecord>) -> Vec<EventRecord> {
    let mut active: Vec<EventRecord> = records.into_iter().filter(EventRecord::is_active).collect();
    active.sort_by(|a, b| match (a.sort_key(), b.sort_key()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    active
}

/// The four columns shown for a booking in the booked-events table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookedRow {
    pub date: String,
    pub event_id: String,
    pub customer_name: String,
    pub event_type: String,
}

impl BookedRow {
    pub fn display_line(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.date, self.event_id, self.customer_name, self.event_type
        )
    }
}

impl From<&EventRecord> for BookedRow {
    fn from(record: &EventRecord) -> Self {
        Self {
            date: record.formatted_date(),
            event_id: record.event_id.clone(),
            customer_name: record.customer_name.clone(),
            event_type: record.event_type.clone(),
        }
    }
}

pub fn booked_rows(records: &[EventRecord]) -> Vec<BookedRow> {
    records.iter().map(BookedRow::from).collect()
}

/// Body of `action=getBookedEvents`
#[derive(Debug, Clone, Deserialize)]
pub struct BookedEventsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Vec<EventRecord>,
}

impl BookedEventsResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

/// Sheet cells come back as strings, numbers, or null depending on how
/// the column was typed.
fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => {
            let s = s.trim();
            ["true", "yes", "y", "1"].iter().any(|t| s.eq_ignore_ascii_case(t))
        }
        _ => false,
    })
}
