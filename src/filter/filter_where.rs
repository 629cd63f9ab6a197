use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};
use crate::resources::ResourceSchema;

/// Translates a where tree into a parameterized Postgres predicate.
///
/// Parameters are bound as text and cast back to the column's declared
/// type, so every placeholder reads `$n::<type>`.
pub struct FilterWhere<'a> {
    schema: &'a ResourceSchema,
    qualifier: Option<&'a str>,
    param_values: Vec<Value>,
    param_index: usize,
}

impl<'a> FilterWhere<'a> {
    pub fn new(schema: &'a ResourceSchema, starting_param_index: usize) -> Self {
        Self {
            schema,
            qualifier: None,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Prefix column references with a table alias
    pub fn qualified(mut self, alias: &'a str) -> Self {
        self.qualifier = Some(alias);
        self
    }

    pub fn generate(
        schema: &'a ResourceSchema,
        where_data: &Value,
        starting_param_index: usize,
        qualifier: Option<&'a str>,
    ) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(schema, starting_param_index);
        filter_where.qualifier = qualifier;
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    pub fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        Self::validate(where_data)?;
        let conditions = self.parse_where_data(where_data)?;
        let where_clause = if conditions.is_empty() { "1=1".to_string() } else { conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<Vec<String>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(vec![]),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut sql_conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                sql_conditions.push(self.parse_logical_operator(key, value)?);
            } else {
                for condition in Self::parse_field_condition(key, value)? {
                    sql_conditions.push(self.build_sql_condition(&condition)?);
                }
            }
        }
        Ok(sql_conditions)
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Ok(if op == "$and" { "1=1" } else { "1=0" }.to_string());
                }
                let mut sql_parts = Vec::new();
                for v in arr {
                    let parts = self.parse_where_data(v)?;
                    let sql = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
                    sql_parts.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", sql_parts.join(joiner)))
            }
            "$not" => {
                let parts = self.parse_where_data(value)?;
                let sql = if parts.is_empty() { "1=1".to_string() } else { parts.join(" AND ") };
                Ok(format!("NOT ({})", sql))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    /// Splits `{ field: value }` and `{ field: { $op: value, ... } }` into conditions
    pub fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => obj
                .iter()
                .map(|(op_key, op_val)| {
                    FilterOp::parse(op_key)
                        .map(|operator| FilterWhereInfo {
                            column: field.to_string(),
                            operator,
                            data: op_val.clone(),
                        })
                        .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))
                })
                .collect(),
            _ => Ok(vec![FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            }]),
        }
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let cast = self
            .schema
            .column_type(&condition.column)
            .ok_or_else(|| FilterError::InvalidColumn(condition.column.clone()))?
            .pg_type();
        let column = match self.qualifier {
            Some(alias) => format!("{}.\"{}\"", alias, condition.column),
            None => format!("\"{}\"", condition.column),
        };
        let data = &condition.data;

        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", column),
            FilterOp::Eq => format!("{} = {}", column, self.param(data, cast)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", column),
            FilterOp::Ne => format!("{} IS DISTINCT FROM {}", column, self.param(data, cast)),
            FilterOp::Gt => format!("{} > {}", column, self.param(data, cast)),
            FilterOp::Gte => format!("{} >= {}", column, self.param(data, cast)),
            FilterOp::Lt => format!("{} < {}", column, self.param(data, cast)),
            FilterOp::Lte => format!("{} <= {}", column, self.param(data, cast)),
            FilterOp::Like => format!("{}::text LIKE {}", column, self.param(data, "text")),
            FilterOp::ILike => format!("{}::text ILIKE {}", column, self.param(data, "text")),
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                let values = match data {
                    Value::Array(values) => values.clone(),
                    other => vec![other.clone()],
                };
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v, cast)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                format!("{} {} ({})", column, keyword, params.join(", "))
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => format!(
                    "{} BETWEEN {} AND {}",
                    column,
                    self.param(&values[0], cast),
                    self.param(&values[1], cast)
                ),
                _ => {
                    return Err(FilterError::InvalidOperatorData(
                        "$between requires exactly 2 values".to_string(),
                    ))
                }
            },
            FilterOp::Null => match data.as_bool() {
                Some(true) => format!("{} IS NULL", column),
                Some(false) => format!("{} IS NOT NULL", column),
                None => return Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        })
    }

    fn param(&mut self, value: &Value, cast: &str) -> String {
        self.param_values.push(value.clone());
        self.param_index += 1;
        format!("${}::{}", self.param_index, cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::registry::{PAYMENTS, REQUESTS};
    use serde_json::json;

    #[test]
    fn equality_casts_to_column_type() {
        let (sql, params) = FilterWhere::generate(&REQUESTS, &json!({"citizen_id": 4, "status": "pending"}), 0, None).unwrap();
        assert_eq!(sql, "\"citizen_id\" = $1::bigint AND \"status\" = $2::text");
        assert_eq!(params, vec![json!(4), json!("pending")]);
    }

    #[test]
    fn or_groups_share_the_parameter_counter() {
        let where_data = json!({
            "$and": [
                {"citizen_id": 1},
                {"$or": [{"subject": {"$ilike": "%road%"}}, {"description": {"$ilike": "%road%"}}]}
            ]
        });
        let (sql, params) = FilterWhere::generate(&REQUESTS, &where_data, 0, Some("t")).unwrap();
        assert_eq!(
            sql,
            "((t.\"citizen_id\" = $1::bigint) AND (((t.\"subject\"::text ILIKE $2::text) OR (t.\"description\"::text ILIKE $3::text))))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn in_list_and_null_checks() {
        let (sql, _) = FilterWhere::generate(
            &PAYMENTS,
            &json!({"status": {"$in": ["pending", "failed"]}, "receipt_number": null}),
            2,
            None,
        )
        .unwrap();
        // Conditions follow key order of the JSON object
        assert_eq!(sql, "\"receipt_number\" IS NULL AND \"status\" IN ($3::text, $4::text)");
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = FilterWhere::generate(&REQUESTS, &json!({"password": "x"}), 0, None).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(c) if c == "password"));
    }

    #[test]
    fn between_requires_two_values() {
        assert!(FilterWhere::generate(&PAYMENTS, &json!({"amount": {"$between": [1]}}), 0, None).is_err());
        let (sql, _) = FilterWhere::generate(&PAYMENTS, &json!({"amount": {"$between": [1, 10]}}), 0, None).unwrap();
        assert_eq!(sql, "\"amount\" BETWEEN $1::numeric AND $2::numeric");
    }
}
