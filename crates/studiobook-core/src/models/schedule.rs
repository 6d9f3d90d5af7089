use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::EventDate;
use crate::utils::format::{format_date_safe, parse_event_timestamp};

/// Cell holding the event id in a schedule row
pub const EVENT_ID_COLUMN: usize = 1;

/// Cells holding dates; cell 0 is the event date the sheet is sorted by
pub const DATE_COLUMNS: [usize; 4] = [0, 7, 8, 23];

/// Body of `action=getData`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

/// One display-ready row of the schedule sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ScheduleRow {
    pub cells: Vec<String>,
}

impl ScheduleRow {
    pub fn from_cells(cells: &[Value]) -> Self {
        let cells = cells
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                if DATE_COLUMNS.contains(&index) {
                    cell_date(cell)
                        .map(|d| format_date_safe(&d))
                        .unwrap_or_default()
                } else {
                    cell_text(cell)
                }
            })
            .collect();
        Self { cells }
    }

    pub fn event_id(&self) -> &str {
        self.cells
            .get(EVENT_ID_COLUMN)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Sort the raw sheet by its first column and format every row. Rows whose
/// first cell is not a date lead the table.
pub fn schedule_rows(mut raw: Vec<Vec<Value>>) -> Vec<ScheduleRow> {
    raw.sort_by_key(|row| row_timestamp(row));
    raw.iter().map(|row| ScheduleRow::from_cells(row)).collect()
}

fn row_timestamp(row: &[Value]) -> Option<NaiveDateTime> {
    row.first()
        .and_then(cell_date)
        .and_then(|d| parse_event_timestamp(&d))
}

fn cell_date(cell: &Value) -> Option<EventDate> {
    match cell {
        Value::Number(n) => n.as_f64().map(EventDate::Serial),
        Value::String(s) => Some(EventDate::Text(s.clone())),
        _ => None,
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_row_formats_by_column() {
        let row = ScheduleRow::from_cells(&[
            json!("2024-03-05"),
            json!(1042),
            json!("Ravi"),
            json!(null),
            json!(25000),
        ]);
        assert_eq!(row.cells, vec!["05-03-2024", "1042", "Ravi", "", "25000"]);
        assert_eq!(row.event_id(), "1042");
    }

    #[test]
    fn test_schedule_row_blank_dates() {
        let mut cells = vec![json!(0); 9];
        cells[7] = json!("0");
        cells[8] = json!("garbage");
        let row = ScheduleRow::from_cells(&cells);
        assert_eq!(row.cells[0], "");
        assert_eq!(row.cells[7], "");
        assert_eq!(row.cells[8], "");
        assert_eq!(row.cells[2], "0");
    }

    #[test]
    fn test_schedule_rows_sorted_by_first_cell() {
        let rows = schedule_rows(vec![
            vec![json!("2024-06-01"), json!("E3")],
            vec![json!("15-01-2024"), json!("E1")],
            vec![json!(""), json!("E0")],
            vec![json!("2024-02-10"), json!("E2")],
        ]);
        let ids: Vec<&str> = rows.iter().map(ScheduleRow::event_id).collect();
        assert_eq!(ids, vec!["E0", "E1", "E2", "E3"]);
    }

    #[test]
    fn test_schedule_response_parses() {
        let resp: ScheduleResponse =
            serde_json::from_str(r#"{"data":[["2024-01-10","E1"],["2024-01-11","E2"]]}"#).unwrap();
        assert_eq!(resp.data.len(), 2);

        let empty: ScheduleResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.data.is_empty());
    }
}
