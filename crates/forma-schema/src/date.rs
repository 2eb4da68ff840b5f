use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::value::FieldValue;

/// Parse the date shapes a date input or an author can produce:
/// `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DDTHH:MM[:SS]` (read as UTC).
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

impl FieldValue {
    /// Text is parsed with [`parse_date`]; numbers are epoch milliseconds.
    pub fn to_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Text(s) => parse_date(s),
            FieldValue::Number(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(*ms as i64).single()
            }
            _ => None,
        }
    }
}
