// In-memory evaluation of the same where/order trees the SQL builder accepts.

use std::cmp::Ordering;

use serde_json::Value;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, SortDirection};
use crate::resources::{ColumnType, ResourceSchema};
use crate::types::{value_as_decimal, Row};

pub fn matches(schema: &ResourceSchema, row: &Row, where_data: &Value) -> Result<bool, FilterError> {
    let obj = match where_data {
        Value::Null => return Ok(true),
        Value::Object(obj) => obj,
        _ => return Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
    };

    for (key, value) in obj {
        let ok = match key.as_str() {
            "$and" => {
                let arr = as_array(key, value)?;
                let mut all = true;
                for v in arr {
                    if !matches(schema, row, v)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let arr = as_array(key, value)?;
                let mut any = false;
                for v in arr {
                    if matches(schema, row, v)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$not" => !matches(schema, row, value)?,
            op if op.starts_with('$') => return Err(FilterError::UnsupportedOperator(op.to_string())),
            field => {
                let kind = schema
                    .column_type(field)
                    .ok_or_else(|| FilterError::InvalidColumn(field.to_string()))?;
                let current = row.get(field).unwrap_or(&Value::Null);
                let mut all = true;
                for condition in FilterWhere::parse_field_condition(field, value)? {
                    if !evaluate(kind, current, condition.operator, &condition.data)? {
                        all = false;
                        break;
                    }
                }
                all
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn as_array<'v>(op: &str, value: &'v Value) -> Result<&'v Vec<Value>, FilterError> {
    value
        .as_array()
        .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))
}

fn evaluate(kind: ColumnType, current: &Value, op: FilterOp, data: &Value) -> Result<bool, FilterError> {
    Ok(match op {
        FilterOp::Eq if data.is_null() => current.is_null(),
        FilterOp::Eq => compare(kind, current, data) == Some(Ordering::Equal),
        FilterOp::Ne if data.is_null() => !current.is_null(),
        FilterOp::Ne => compare(kind, current, data) != Some(Ordering::Equal),
        FilterOp::Gt => compare(kind, current, data) == Some(Ordering::Greater),
        FilterOp::Gte => matches!(compare(kind, current, data), Some(Ordering::Greater | Ordering::Equal)),
        FilterOp::Lt => compare(kind, current, data) == Some(Ordering::Less),
        FilterOp::Lte => matches!(compare(kind, current, data), Some(Ordering::Less | Ordering::Equal)),
        FilterOp::Like | FilterOp::ILike => {
            let pattern = data
                .as_str()
                .ok_or_else(|| FilterError::InvalidOperatorData("LIKE pattern must be a string".to_string()))?;
            match text_of(current) {
                Some(text) if op == FilterOp::ILike => like(&text.to_lowercase(), &pattern.to_lowercase()),
                Some(text) => like(&text, pattern),
                None => false,
            }
        }
        FilterOp::In | FilterOp::NIn => {
            let values = match data {
                Value::Array(values) => values.clone(),
                other => vec![other.clone()],
            };
            let found = values.iter().any(|v| compare(kind, current, v) == Some(Ordering::Equal));
            if op == FilterOp::In { found } else { !current.is_null() && !found }
        }
        FilterOp::Between => match data {
            Value::Array(values) if values.len() == 2 => {
                matches!(compare(kind, current, &values[0]), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(kind, current, &values[1]), Some(Ordering::Less | Ordering::Equal))
            }
            _ => {
                return Err(FilterError::InvalidOperatorData(
                    "$between requires exactly 2 values".to_string(),
                ))
            }
        },
        FilterOp::Null => match data.as_bool() {
            Some(expect_null) => current.is_null() == expect_null,
            None => return Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
        },
    })
}

/// SQL-style comparison: anything against NULL is unknown
fn compare(kind: ColumnType, current: &Value, operand: &Value) -> Option<Ordering> {
    if current.is_null() || operand.is_null() {
        return None;
    }
    match kind {
        ColumnType::Integer | ColumnType::Decimal => {
            Some(value_as_decimal(current)?.cmp(&value_as_decimal(operand)?))
        }
        ColumnType::Json => (current == operand).then_some(Ordering::Equal),
        _ => {
            let left = kind.normalize(current).ok()?;
            let right = kind.normalize(operand).ok()?;
            match (&left, &right) {
                (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            }
        }
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// SQL LIKE with `%` and `_` wildcards
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    let (mut t, mut p) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '%' {
        p += 1;
    }
    p == pattern.len()
}

/// Ordering for in-memory sorts; NULLs sort as the largest value, as Postgres does
pub fn compare_rows(schema: &ResourceSchema, a: &Row, b: &Row, order: &[FilterOrderInfo]) -> Ordering {
    for info in order {
        let kind = schema.column_type(&info.column).unwrap_or(ColumnType::Text);
        let left = a.get(&info.column).unwrap_or(&Value::Null);
        let right = b.get(&info.column).unwrap_or(&Value::Null);
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare(kind, left, right).unwrap_or(Ordering::Equal),
        };
        let ordering = match info.sort {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
