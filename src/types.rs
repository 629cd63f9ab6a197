/// Shared types used across the codebase

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::str::FromStr;

/// A stored row as it travels between the store, the pipeline and the API
pub type Row = Map<String, Value>;

/// Write operations that flow through the observer pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

/// Row id as stored in the `id` column
pub fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(value_as_i64)
}

pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn value_as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64_retain)),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Decimals leave the API as JSON numbers rounded to cents
pub fn decimal_value(d: Decimal) -> Value {
    d.round_dp(2)
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub fn value_as_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(value).map(|dt| dt.date_naive()))
}

pub fn parse_time(value: &Value) -> Option<NaiveTime> {
    let s = value.as_str()?.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

pub fn parse_datetime(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn date_value(date: NaiveDate) -> Value {
    Value::String(date.format("%Y-%m-%d").to_string())
}

pub fn time_value(time: NaiveTime) -> Value {
    Value::String(time.format("%H:%M:%S").to_string())
}

pub fn datetime_value(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn now_value() -> Value {
    datetime_value(Utc::now())
}

pub fn today_value() -> Value {
    date_value(Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decimals_accept_numbers_and_strings() {
        assert_eq!(value_as_decimal(&json!(12.5)), Decimal::from_str("12.5").ok());
        assert_eq!(value_as_decimal(&json!("99.99")), Decimal::from_str("99.99").ok());
        assert_eq!(value_as_decimal(&json!(true)), None);
        assert_eq!(decimal_value(Decimal::from_str("10.005").unwrap()), json!(10.0));
    }

    #[test]
    fn datetimes_accept_common_layouts() {
        let expected = "2024-03-01T08:30:00Z";
        for input in ["2024-03-01T08:30:00Z", "2024-03-01 08:30:00", "2024-03-01T08:30", "2024-03-01T09:30:00+01:00"] {
            let dt = parse_datetime(&json!(input)).unwrap_or_else(|| panic!("failed to parse {}", input));
            assert_eq!(datetime_value(dt), json!(expected), "input {}", input);
        }
        assert_eq!(datetime_value(parse_datetime(&json!("2024-03-01")).unwrap()), json!("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn times_accept_minutes_precision() {
        assert_eq!(time_value(parse_time(&json!("08:30")).unwrap()), json!("08:30:00"));
        assert!(parse_time(&json!("8h30")).is_none());
    }

    #[test]
    fn ids_parse_from_numbers_and_strings() {
        assert_eq!(value_as_i64(&json!(7)), Some(7));
        assert_eq!(value_as_i64(&json!("42")), Some(42));
        assert_eq!(value_as_i64(&json!(1.5)), None);
    }
}
