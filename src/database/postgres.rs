use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryScalar;
use sqlx::{PgPool, Postgres};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::store::Store;
use crate::filter::filter_where::FilterWhere;
use crate::filter::{Filter, FilterData, TABLE_ALIAS};
use crate::resources::{ColumnType, ResourceSchema};
use crate::types::{datetime_value, parse_datetime, Row};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Column list for a write; every key must be a declared column
    fn column_list(schema: &ResourceSchema, row: &Row) -> Result<Vec<String>, DatabaseError> {
        row.keys()
            .map(|key| {
                schema
                    .column_type(key)
                    .map(|_| format!("\"{}\"", key))
                    .ok_or_else(|| DatabaseError::QueryError(format!("unknown column {}.{}", schema.table, key)))
            })
            .collect()
    }

    async fn fetch_rows(
        &self,
        schema: &ResourceSchema,
        query: &str,
        params: Vec<Value>,
    ) -> Result<Vec<Row>, DatabaseError> {
        tracing::debug!(sql = %query, "pg select");
        let values = bind_all(sqlx::query_scalar::<_, Value>(query), params)
            .fetch_all(&self.pool)
            .await?;
        Ok(values.into_iter().filter_map(|v| into_row(schema, v)).collect())
    }
}

/// Parameters are bound as text; the SQL casts them to the column type
fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn bind_all<'q, O>(
    mut query: QueryScalar<'q, Postgres, O, PgArguments>,
    params: Vec<Value>,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    for param in params {
        query = query.bind(param_text(&param));
    }
    query
}

/// row_to_json renders timestamptz with a numeric offset; rows leave the
/// store in the same RFC 3339 `Z` form the in-memory backend uses
fn into_row(schema: &ResourceSchema, value: Value) -> Option<Row> {
    let Value::Object(mut row) = value else { return None };
    for (key, value) in row.iter_mut() {
        if schema.column_type(key) == Some(ColumnType::DateTime) {
            if let Some(dt) = parse_datetime(value) {
                *value = datetime_value(dt);
            }
        }
    }
    Some(row)
}

#[async_trait]
impl Store for PgStore {
    async fn select(&self, schema: &'static ResourceSchema, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let mut builder = Filter::new(schema);
        builder.assign(filter)?;
        let sql = builder.to_sql()?;
        self.fetch_rows(schema, &sql.query, sql.params).await
    }

    async fn count(&self, schema: &'static ResourceSchema, filter: FilterData) -> Result<i64, DatabaseError> {
        let mut builder = Filter::new(schema);
        builder.where_clause(filter.where_clause.unwrap_or(Value::Null))?;
        let sql = builder.to_count_sql()?;
        let count = bind_all(sqlx::query_scalar::<_, i64>(&sql.query), sql.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert(&self, schema: &'static ResourceSchema, row: Row) -> Result<Row, DatabaseError> {
        let columns = Self::column_list(schema, &row)?.join(", ");
        let query = format!(
            "INSERT INTO \"{table}\" AS {alias} ({columns}) \
             SELECT {columns} FROM json_populate_record(NULL::\"{table}\", $1::json) \
             RETURNING row_to_json({alias}.*)",
            table = schema.table,
            alias = TABLE_ALIAS,
            columns = columns,
        );
        let value = sqlx::query_scalar::<_, Value>(&query)
            .bind(Value::Object(row).to_string())
            .fetch_one(&self.pool)
            .await?;
        into_row(schema, value).ok_or_else(|| DatabaseError::QueryError("insert returned no row".to_string()))
    }

    async fn update(
        &self,
        schema: &'static ResourceSchema,
        id: i64,
        changes: Row,
        guard: Option<Value>,
    ) -> Result<Option<Row>, DatabaseError> {
        if changes.is_empty() {
            return Err(DatabaseError::QueryError("update without changes".to_string()));
        }
        let assignments = Self::column_list(schema, &changes)?
            .iter()
            .map(|column| format!("{} = r.{}", column, column))
            .collect::<Vec<_>>()
            .join(", ");

        let (guard_sql, guard_params) = match guard {
            Some(ref guard) => FilterWhere::generate(schema, guard, 2, Some(TABLE_ALIAS))?,
            None => ("1=1".to_string(), vec![]),
        };

        let query = format!(
            "UPDATE \"{table}\" AS {alias} SET {assignments} \
             FROM json_populate_record(NULL::\"{table}\", $1::json) AS r \
             WHERE {alias}.\"id\" = $2::bigint AND {guard} \
             RETURNING row_to_json({alias}.*)",
            table = schema.table,
            alias = TABLE_ALIAS,
            assignments = assignments,
            guard = guard_sql,
        );
        let query_builder = sqlx::query_scalar::<_, Value>(&query)
            .bind(Value::Object(changes).to_string())
            .bind(id.to_string());
        let value = bind_all(query_builder, guard_params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.and_then(|v| into_row(schema, v)))
    }

    async fn delete(&self, schema: &'static ResourceSchema, id: i64) -> Result<Option<Row>, DatabaseError> {
        let query = format!(
            "DELETE FROM \"{table}\" AS {alias} WHERE {alias}.\"id\" = $1::bigint RETURNING row_to_json({alias}.*)",
            table = schema.table,
            alias = TABLE_ALIAS,
        );
        let value = sqlx::query_scalar::<_, Value>(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.and_then(|v| into_row(schema, v)))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
