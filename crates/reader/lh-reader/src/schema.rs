//! Column-to-field mapping for log records.

use chrono::{NaiveDateTime, TimeZone, Utc};
use lh_error::RecordError;
use lh_types::Event;
use serde_json::{Number, Value};

/// Schema tag carried by events from [`W3cAccessSchema`].
pub const W3C_ACCESS_SCHEMA: &str = "w3c-access/1";

/// Turns one filtered record line into an [`Event`].
///
/// Implementations must be deterministic: the same line always produces an
/// identical event.
pub trait RecordParser: Send + Sync {
    /// Schema tag attached to every produced event.
    fn schema_tag(&self) -> &str;

    /// Parse one line (no terminator, already filtered).
    fn parse(&self, line: &str) -> std::result::Result<Event, RecordError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Timestamp,
    Text,
    Number,
}

const W3C_FIELDS: [(&str, FieldKind); 19] = [
    ("date", FieldKind::Timestamp),
    ("time", FieldKind::Timestamp),
    ("s-sitename", FieldKind::Text),
    ("cs-method", FieldKind::Text),
    ("cs-uri-stem", FieldKind::Text),
    ("cs-uri-query", FieldKind::Text),
    ("s-port", FieldKind::Number),
    ("cs-username", FieldKind::Text),
    ("c-ip", FieldKind::Text),
    ("cs(User-Agent)", FieldKind::Text),
    ("cs(Cookie)", FieldKind::Text),
    ("cs(Referer)", FieldKind::Text),
    ("cs-host", FieldKind::Text),
    ("sc-status", FieldKind::Number),
    ("sc-substatus", FieldKind::Number),
    ("sc-win32-status", FieldKind::Number),
    ("sc-bytes", FieldKind::Number),
    ("cs-bytes", FieldKind::Number),
    ("time-taken", FieldKind::Number),
];

/// W3C extended access log with the 19-column IIS field layout.
///
/// Columns are separated by single spaces. `date` and `time` form the UTC
/// event timestamp and are not repeated as fields. Numeric columns become
/// JSON numbers, with the `-` placeholder mapped to `null`. Double quotes in
/// text columns are replaced with single quotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct W3cAccessSchema;

impl W3cAccessSchema {
    /// Number of columns in a record.
    pub const COLUMNS: usize = W3C_FIELDS.len();

    /// Field names in column order.
    pub fn field_names() -> impl Iterator<Item = &'static str> {
        W3C_FIELDS.iter().map(|(name, _)| *name)
    }
}

impl RecordParser for W3cAccessSchema {
    fn schema_tag(&self) -> &str {
        W3C_ACCESS_SCHEMA
    }

    fn parse(&self, line: &str) -> std::result::Result<Event, RecordError> {
        let columns: Vec<&str> = line.split(' ').collect();
        if columns.len() != Self::COLUMNS {
            return Err(RecordError::ColumnCount {
                expected: Self::COLUMNS,
                actual: columns.len(),
            });
        }

        let stamp = format!("{} {}", columns[0], columns[1]);
        let timestamp = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S")
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|_| RecordError::Timestamp(stamp.clone()))?;

        let mut event = Event::new(W3C_ACCESS_SCHEMA, timestamp);
        for ((name, kind), value) in W3C_FIELDS.iter().zip(columns) {
            let value = match kind {
                FieldKind::Timestamp => continue,
                FieldKind::Text => Value::String(value.replace('"', "'")),
                FieldKind::Number => parse_number(name, value)?,
            };
            event.fields.insert((*name).to_string(), value);
        }

        Ok(event)
    }
}

/// Integer when possible, else a finite float; `-` is null.
fn parse_number(field: &str, value: &str) -> std::result::Result<Value, RecordError> {
    if value == "-" {
        return Ok(Value::Null);
    }
    if let Ok(n) = value.parse::<i64>() {
        return Ok(Value::Number(n.into()));
    }
    if let Ok(n) = value.parse::<u64>() {
        return Ok(Value::Number(n.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| RecordError::Number {
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LINE: &str =
        "2024-01-01 00:00:05 site1 GET /x - 80 - 1.2.3.4 - - - host 200 0 0 100 50 10";

    #[test]
    fn test_parse_reference_line() {
        let event = W3cAccessSchema.parse(LINE).unwrap();

        assert_eq!(event.schema, "w3c-access/1");
        assert_eq!(event.timestamp.to_rfc3339(), "2024-01-01T00:00:05+00:00");
        assert_eq!(event.field("s-sitename"), Some(&json!("site1")));
        assert_eq!(event.field("cs-method"), Some(&json!("GET")));
        assert_eq!(event.field("cs-uri-stem"), Some(&json!("/x")));
        assert_eq!(event.field("cs-uri-query"), Some(&json!("-")));
        assert_eq!(event.field("s-port"), Some(&json!(80)));
        assert_eq!(event.field("sc-status"), Some(&json!(200)));
        assert_eq!(event.field("sc-bytes"), Some(&json!(100)));
        assert_eq!(event.field("time-taken"), Some(&json!(10)));
        assert_eq!(event.field("date"), None);
        assert_eq!(event.fields.len(), 17);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(
            W3cAccessSchema.parse(LINE).unwrap(),
            W3cAccessSchema.parse(LINE).unwrap()
        );
    }

    #[test]
    fn test_parse_column_count() {
        let result = W3cAccessSchema.parse("2024-01-01 00:00:05 site1 GET");
        assert_eq!(
            result,
            Err(RecordError::ColumnCount {
                expected: 19,
                actual: 4
            })
        );

        // A doubled separator yields an empty column and a mismatch
        let doubled = LINE.replacen(' ', "  ", 1);
        assert!(matches!(
            W3cAccessSchema.parse(&doubled),
            Err(RecordError::ColumnCount { actual: 20, .. })
        ));
    }

    #[test]
    fn test_parse_bad_timestamp() {
        let line = LINE.replace("00:00:05", "25:00:00");
        assert_eq!(
            W3cAccessSchema.parse(&line),
            Err(RecordError::Timestamp("2024-01-01 25:00:00".to_string()))
        );
    }

    #[test]
    fn test_parse_numeric_placeholder_and_float() {
        let line = LINE.replace(" 80 ", " - ");
        let line = format!("{} 1.5", line.strip_suffix(" 10").unwrap());
        let event = W3cAccessSchema.parse(&line).unwrap();

        assert_eq!(event.field("s-port"), Some(&Value::Null));
        assert_eq!(event.field("time-taken"), Some(&json!(1.5)));
    }

    #[test]
    fn test_parse_non_numeric_is_malformed() {
        let line = LINE.replace(" 200 ", " OK ");
        assert_eq!(
            W3cAccessSchema.parse(&line),
            Err(RecordError::Number {
                field: "sc-status".to_string(),
                value: "OK".to_string()
            })
        );
    }

    #[test]
    fn test_parse_replaces_double_quotes() {
        let line = LINE.replace(" host ", " \"host\" ");
        let event = W3cAccessSchema.parse(&line).unwrap();
        assert_eq!(event.field("cs-host"), Some(&json!("'host'")));
    }

    #[test]
    fn test_field_names() {
        let names: Vec<&str> = W3cAccessSchema::field_names().collect();
        assert_eq!(names.len(), W3cAccessSchema::COLUMNS);
        assert_eq!(names[6], "s-port");
        assert_eq!(names[18], "time-taken");
    }
}
