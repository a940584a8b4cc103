// ABOUTME: Field-level transforms applied while copying rows to PostgreSQL
// ABOUTME: Timestamp epoch normalization, boolean coercion, and JSON payload parsing

use crate::plan::Transform;
use crate::postgres::types::PgValue;
use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

/// Epoch values above this are treated as milliseconds rather than seconds.
/// 10,000,000,000 seconds is the year 2286, far past any timestamp this
/// dataset can contain, while 10,000,000,000 milliseconds is early 1970.
const MILLIS_EPOCH_THRESHOLD: i64 = 10_000_000_000;

/// Apply the declared transform for a column to a raw SQLite value.
///
/// `Json` never fails (malformed payloads fall back to the raw text);
/// `Timestamp` and `Boolean` return an error for values they cannot
/// interpret, which callers treat as a recoverable per-row failure.
pub fn convert_value(value: Value, transform: Transform) -> Result<PgValue> {
    match transform {
        Transform::Passthrough => Ok(passthrough(value)),
        Transform::Timestamp => convert_timestamp(value),
        Transform::Boolean => convert_bool(value),
        Transform::Json => Ok(convert_json(value)),
    }
}

/// Carry a SQLite value over unchanged.
pub fn passthrough(value: Value) -> PgValue {
    match value {
        Value::Null => PgValue::Null,
        Value::Integer(i) => PgValue::BigInt(i),
        Value::Real(f) => PgValue::Double(f),
        Value::Text(s) => PgValue::Text(s),
        Value::Blob(b) => PgValue::Bytea(b),
    }
}

/// Convert an epoch-based timestamp column to an absolute point in time.
///
/// Numeric values above [`MILLIS_EPOCH_THRESHOLD`] are interpreted as epoch
/// milliseconds and floor-divided down to seconds, so a millisecond value
/// converts identically to its seconds-based counterpart. Text values are
/// accepted in RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff]` form.
pub fn convert_timestamp(value: Value) -> Result<PgValue> {
    match value {
        Value::Null => Ok(PgValue::Null),
        Value::Integer(i) => epoch_seconds_to_timestamp(normalize_epoch(i)),
        Value::Real(f) => {
            if !f.is_finite() {
                bail!("non-finite number {} is not a valid timestamp", f);
            }
            epoch_seconds_to_timestamp(normalize_epoch(f as i64))
        }
        Value::Text(s) => parse_text_timestamp(&s),
        Value::Blob(_) => bail!("blob value is not a valid timestamp"),
    }
}

fn normalize_epoch(raw: i64) -> i64 {
    if raw > MILLIS_EPOCH_THRESHOLD {
        raw / 1000
    } else {
        raw
    }
}

fn epoch_seconds_to_timestamp(secs: i64) -> Result<PgValue> {
    match Utc.timestamp_opt(secs, 0) {
        chrono::LocalResult::Single(dt) => Ok(PgValue::Timestamp(dt)),
        _ => bail!("epoch value {} is out of timestamp range", secs),
    }
}

fn parse_text_timestamp(s: &str) -> Result<PgValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(PgValue::Timestamp(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(PgValue::Timestamp(naive.and_utc()));
    }
    bail!("text value '{}' is not a recognized timestamp format", s)
}

/// Coerce a boolean-like column value to true/false, preserving null.
pub fn convert_bool(value: Value) -> Result<PgValue> {
    match value {
        Value::Null => Ok(PgValue::Null),
        Value::Integer(i) => Ok(PgValue::Bool(i != 0)),
        Value::Real(f) => Ok(PgValue::Bool(f != 0.0)),
        Value::Text(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "1" => Ok(PgValue::Bool(true)),
            "false" | "f" | "0" => Ok(PgValue::Bool(false)),
            other => bail!("text value '{}' is not a recognized boolean", other),
        },
        Value::Blob(_) => bail!("blob value is not a recognized boolean"),
    }
}

/// Convert a structured-content column to a JSON value.
///
/// Textual payloads are parsed; when parsing fails the raw text is stored
/// verbatim as an opaque JSON string rather than failing the row, matching
/// how the dataset treated free-form content before migration.
pub fn convert_json(value: Value) -> PgValue {
    match value {
        Value::Null => PgValue::Null,
        Value::Text(s) => match serde_json::from_str::<JsonValue>(&s) {
            Ok(parsed) => PgValue::Json(parsed),
            Err(_) => PgValue::Json(JsonValue::String(s)),
        },
        Value::Integer(i) => PgValue::Json(JsonValue::Number(i.into())),
        Value::Real(f) => {
            // JSON cannot represent NaN or infinity, store those as strings
            match serde_json::Number::from_f64(f) {
                Some(n) => PgValue::Json(JsonValue::Number(n)),
                None => PgValue::Json(JsonValue::String(f.to_string())),
            }
        }
        Value::Blob(b) => {
            let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b);
            PgValue::Json(serde_json::json!({
                "_type": "blob",
                "data": encoded
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(value: Value) -> PgValue {
        convert_timestamp(value).unwrap()
    }

    #[test]
    fn timestamp_null_stays_null() {
        assert_eq!(ts(Value::Null), PgValue::Null);
    }

    #[test]
    fn timestamp_seconds_and_millis_agree() {
        let secs = 1_700_000_000_i64;
        let from_seconds = ts(Value::Integer(secs));
        let from_millis = ts(Value::Integer(secs * 1000));
        assert_eq!(from_seconds, from_millis);
    }

    #[test]
    fn timestamp_threshold_boundary_is_seconds() {
        // Exactly at the threshold the value is still seconds
        let at = ts(Value::Integer(MILLIS_EPOCH_THRESHOLD));
        match at {
            PgValue::Timestamp(dt) => assert_eq!(dt.timestamp(), MILLIS_EPOCH_THRESHOLD),
            other => panic!("expected timestamp, got {:?}", other),
        }
    }

    #[test]
    fn timestamp_conversion_is_monotonic() {
        let inputs = [
            0_i64,
            1,
            999,
            1_700_000_000,
            1_700_000_000_123,
            1_800_000_000_000,
        ];
        let mut converted = Vec::new();
        for raw in inputs {
            match ts(Value::Integer(raw)) {
                PgValue::Timestamp(dt) => converted.push(dt),
                other => panic!("expected timestamp, got {:?}", other),
            }
        }
        // The raw inputs are increasing, conversions must not reorder
        for pair in converted.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn timestamp_text_formats_parse() {
        let rfc = ts(Value::Text("2024-03-01T10:30:00Z".to_string()));
        let sql = ts(Value::Text("2024-03-01 10:30:00.000".to_string()));
        assert_eq!(rfc, sql);
    }

    #[test]
    fn timestamp_garbage_text_is_an_error() {
        assert!(convert_timestamp(Value::Text("not a date".to_string())).is_err());
    }

    #[test]
    fn bool_coercion_table() {
        assert_eq!(convert_bool(Value::Null).unwrap(), PgValue::Null);
        assert_eq!(
            convert_bool(Value::Integer(0)).unwrap(),
            PgValue::Bool(false)
        );
        assert_eq!(convert_bool(Value::Integer(1)).unwrap(), PgValue::Bool(true));
        assert_eq!(
            convert_bool(Value::Integer(-7)).unwrap(),
            PgValue::Bool(true)
        );
        assert_eq!(convert_bool(Value::Real(0.0)).unwrap(), PgValue::Bool(false));
        assert_eq!(convert_bool(Value::Real(2.5)).unwrap(), PgValue::Bool(true));
        assert_eq!(
            convert_bool(Value::Text("true".to_string())).unwrap(),
            PgValue::Bool(true)
        );
        assert_eq!(
            convert_bool(Value::Text("F".to_string())).unwrap(),
            PgValue::Bool(false)
        );
        assert!(convert_bool(Value::Text("maybe".to_string())).is_err());
    }

    #[test]
    fn json_text_is_parsed_structurally() {
        let converted = convert_json(Value::Text(r#"{"color":"red"}"#.to_string()));
        assert_eq!(
            converted,
            PgValue::Json(serde_json::json!({"color": "red"}))
        );
    }

    #[test]
    fn json_roundtrip_preserves_value() {
        let original =
            serde_json::json!({"hero": {"title": "Benvenuti"}, "sections": [1, 2, 3]});
        let text = original.to_string();
        match convert_json(Value::Text(text)) {
            PgValue::Json(parsed) => assert_eq!(parsed, original),
            other => panic!("expected json, got {:?}", other),
        }
    }

    #[test]
    fn malformed_json_is_stored_verbatim() {
        let raw = "{not json at all";
        match convert_json(Value::Text(raw.to_string())) {
            PgValue::Json(JsonValue::String(s)) => assert_eq!(s, raw),
            other => panic!("expected opaque string, got {:?}", other),
        }
    }

    #[test]
    fn json_null_stays_null() {
        assert_eq!(convert_json(Value::Null), PgValue::Null);
    }

    #[test]
    fn json_non_finite_float_becomes_string() {
        match convert_json(Value::Real(f64::NAN)) {
            PgValue::Json(JsonValue::String(_)) => {}
            other => panic!("expected string fallback, got {:?}", other),
        }
    }

    #[test]
    fn passthrough_preserves_all_variants() {
        assert_eq!(passthrough(Value::Null), PgValue::Null);
        assert_eq!(passthrough(Value::Integer(5)), PgValue::BigInt(5));
        assert_eq!(passthrough(Value::Real(1.5)), PgValue::Double(1.5));
        assert_eq!(
            passthrough(Value::Text("it".to_string())),
            PgValue::Text("it".to_string())
        );
        assert_eq!(
            passthrough(Value::Blob(vec![1, 2, 3])),
            PgValue::Bytea(vec![1, 2, 3])
        );
    }

    #[test]
    fn convert_value_dispatches_by_transform() {
        let published = convert_value(Value::Integer(1), Transform::Boolean).unwrap();
        assert_eq!(published, PgValue::Bool(true));

        let id = convert_value(Value::Integer(1), Transform::Passthrough).unwrap();
        assert_eq!(id, PgValue::BigInt(1));
    }
}
