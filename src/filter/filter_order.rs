use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};
use crate::resources::ResourceSchema;

pub struct FilterOrder;

impl FilterOrder {
    /// Accepts `"-created_at,name"`, `"created_at desc"`, arrays of those, or
    /// `{ "created_at": "desc" }`
    pub fn validate_and_parse(order: &Value, schema: &ResourceSchema) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => arr
                .iter()
                .filter_map(Value::as_str)
                .flat_map(Self::parse_order_string)
                .collect(),
            Value::Object(obj) => obj
                .iter()
                .map(|(k, v)| {
                    let desc = v.as_str().map(|s| s.eq_ignore_ascii_case("desc")).unwrap_or(false);
                    FilterOrderInfo {
                        column: k.clone(),
                        sort: if desc { SortDirection::Desc } else { SortDirection::Asc },
                    }
                })
                .collect(),
            _ => return Err(FilterError::InvalidOperatorData("order must be a string, array or object".to_string())),
        };

        for info in &infos {
            if schema.column_type(&info.column).is_none() {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(column) = trimmed.strip_prefix('-') {
                out.push(FilterOrderInfo { column: column.trim().to_string(), sort: SortDirection::Desc });
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        out
    }

    pub fn generate(infos: &[FilterOrderInfo], qualifier: Option<&str>) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| match qualifier {
                Some(alias) => format!("{}.\"{}\" {}", alias, i.column, i.sort.to_sql()),
                None => format!("\"{}\" {}", i.column, i.sort.to_sql()),
            })
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::registry::TASKS;
    use serde_json::json;

    #[test]
    fn dash_prefix_sorts_descending() {
        let infos = FilterOrder::validate_and_parse(&json!("-due_date, title"), &TASKS).unwrap();
        assert_eq!(FilterOrder::generate(&infos, Some("t")), "ORDER BY t.\"due_date\" DESC, t.\"title\" ASC");
    }

    #[test]
    fn rejects_undeclared_columns() {
        assert!(FilterOrder::validate_and_parse(&json!("salary desc"), &TASKS).is_err());
        assert!(FilterOrder::validate_and_parse(&json!({"id": "desc"}), &TASKS).is_ok());
    }
}
