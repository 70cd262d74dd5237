//! Row representation shared by every pipeline stage

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// An ordered mapping from attribute name to value
///
/// Insertion order is preserved, so exported attributes keep the metadata
/// attribute order.
pub type Row = serde_json::Map<String, Value>;

/// Storage format of datetime attributes
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format of date attributes
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render an ID value as a string; autoincrement IDs are numbers
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// ID of a row, if present
pub fn row_id(row: &Row) -> Option<String> {
    row.get("id").and_then(id_to_string)
}

/// Current UTC time in storage format
pub fn now_string() -> String {
    Utc::now().naive_utc().format(DATETIME_FORMAT).to_string()
}

/// Parse a stored datetime, accepting a bare date as midnight
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a datetime in storage format
pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}
