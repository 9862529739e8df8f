use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use super::model::Value;

/// Formats tried, in order, for text carrying both a date and a time.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Formats tried, in order, for date-only text.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

/// Outcome of normalising one cell to a date/time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCell {
    Parsed(NaiveDateTime),
    Absent,
}

impl DateCell {
    pub fn is_parsed(&self) -> bool {
        matches!(self, DateCell::Parsed(_))
    }
}

impl From<DateCell> for Value {
    fn from(cell: DateCell) -> Self {
        match cell {
            DateCell::Parsed(dt) => Value::DateTime(dt),
            DateCell::Absent => Value::Null,
        }
    }
}

/// Interpret a cell as a calendar date/time.
///
/// Text is matched against RFC 3339 and a fixed list of common layouts;
/// numbers are seconds since the Unix epoch (UTC). Anything else, and any
/// text that matches no layout, yields [`DateCell::Absent`].
pub fn parse_datetime(value: &Value) -> DateCell {
    let parsed = match value {
        Value::DateTime(dt) => Some(*dt),
        Value::Text(s) => parse_text(s),
        Value::Integer(secs) => from_epoch_seconds(*secs as f64),
        Value::Float(secs) => from_epoch_seconds(*secs),
        Value::Bool(_) | Value::Null => None,
    };
    parsed.map_or(DateCell::Absent, DateCell::Parsed)
}

fn parse_text(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn from_epoch_seconds(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}

/// Canonical text form: `YYYY-MM-DD` at midnight, otherwise
/// `YYYY-MM-DD HH:MM:SS` with a fractional part only when non-zero.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
    }
}
