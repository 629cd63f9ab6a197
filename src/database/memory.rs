use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::store::Store;
use crate::filter::filter_order::FilterOrder;
use crate::filter::matcher;
use crate::filter::{FilterData, FilterOrderInfo, SortDirection};
use crate::resources::{registry, ResourceSchema};
use crate::types::{now_value, row_id, Row};

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, Row>,
}

/// Store backed by process memory, with the unique and foreign-key
/// behaviour of the Postgres schema. Used when no DATABASE_URL is set
/// and by the integration tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered(
        schema: &'static ResourceSchema,
        table: Option<&Table>,
        filter: &FilterData,
    ) -> Result<Vec<Row>, DatabaseError> {
        let where_clause = filter.where_clause.clone().unwrap_or(Value::Null);
        let mut rows = Vec::new();
        if let Some(table) = table {
            for row in table.rows.values() {
                if matcher::matches(schema, row, &where_clause)? {
                    rows.push(row.clone());
                }
            }
        }
        Ok(rows)
    }

    fn check_unique(
        schema: &'static ResourceSchema,
        table: Option<&Table>,
        row: &Row,
        self_id: Option<i64>,
    ) -> Result<(), DatabaseError> {
        let Some(table) = table else { return Ok(()) };
        for column in schema.unique_columns() {
            let Some(value) = row.get(column.name).filter(|v| !v.is_null()) else { continue };
            let taken = table
                .rows
                .iter()
                .any(|(id, other)| Some(*id) != self_id && other.get(column.name) == Some(value));
            if taken {
                return Err(DatabaseError::UniqueViolation {
                    table: schema.table.to_string(),
                    column: column.name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_references(
        schema: &'static ResourceSchema,
        tables: &HashMap<&'static str, Table>,
        row: &Row,
    ) -> Result<(), DatabaseError> {
        for column in schema.columns {
            let Some(target) = column.references else { continue };
            let Some(value) = row.get(column.name).filter(|v| !v.is_null()) else { continue };
            let exists = value
                .as_i64()
                .map(|id| tables.get(target).map(|t| t.rows.contains_key(&id)).unwrap_or(false))
                .unwrap_or(false);
            if !exists {
                return Err(DatabaseError::ForeignKeyViolation(format!(
                    "{}.{} references a missing {} row",
                    schema.table, column.name, target
                )));
            }
        }
        Ok(())
    }

    /// ON DELETE RESTRICT across every table that points at `schema`
    fn check_not_referenced(
        schema: &'static ResourceSchema,
        tables: &HashMap<&'static str, Table>,
        id: i64,
    ) -> Result<(), DatabaseError> {
        for other in registry::ALL {
            let Some(table) = tables.get(other.table) else { continue };
            for column in other.columns.iter().filter(|c| c.references == Some(schema.table)) {
                let referenced = table
                    .rows
                    .values()
                    .any(|row| row.get(column.name).and_then(Value::as_i64) == Some(id));
                if referenced {
                    return Err(DatabaseError::ForeignKeyViolation(format!(
                        "{} {} is still referenced by {}.{}",
                        schema.label, id, other.table, column.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, schema: &'static ResourceSchema, filter: FilterData) -> Result<Vec<Row>, DatabaseError> {
        let order = match filter.order {
            Some(ref order) => FilterOrder::validate_and_parse(order, schema)?,
            None => vec![FilterOrderInfo { column: "id".to_string(), sort: SortDirection::Asc }],
        };

        let tables = self.tables.read().await;
        let mut rows = Self::filtered(schema, tables.get(schema.table), &filter)?;
        drop(tables);

        rows.sort_by(|a, b| matcher::compare_rows(schema, a, b, &order));
        let offset = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, schema: &'static ResourceSchema, filter: FilterData) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = Self::filtered(schema, tables.get(schema.table), &filter)?;
        Ok(rows.len() as i64)
    }

    async fn find(&self, schema: &'static ResourceSchema, id: i64) -> Result<Option<Row>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.get(schema.table).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn insert(&self, schema: &'static ResourceSchema, mut row: Row) -> Result<Row, DatabaseError> {
        let mut tables = self.tables.write().await;
        Self::check_references(schema, &tables, &row)?;
        Self::check_unique(schema, tables.get(schema.table), &row, None)?;

        let table = tables.entry(schema.table).or_default();
        let id = match row_id(&row) {
            Some(id) if table.rows.contains_key(&id) => {
                return Err(DatabaseError::UniqueViolation {
                    table: schema.table.to_string(),
                    column: "id".to_string(),
                })
            }
            Some(id) => id,
            None => table.next_id + 1,
        };
        table.next_id = table.next_id.max(id);

        let now = now_value();
        row.insert("id".to_string(), Value::from(id));
        row.entry("created_at").or_insert_with(|| now.clone());
        row.entry("updated_at").or_insert(now);
        for column in schema.columns {
            row.entry(column.name).or_insert(Value::Null);
        }

        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        schema: &'static ResourceSchema,
        id: i64,
        changes: Row,
        guard: Option<Value>,
    ) -> Result<Option<Row>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.get(schema.table).and_then(|t| t.rows.get(&id)).cloned() else {
            return Ok(None);
        };
        if let Some(ref guard) = guard {
            if !matcher::matches(schema, &current, guard)? {
                return Ok(None);
            }
        }

        let mut updated = current;
        for (key, value) in changes {
            if key != "id" {
                updated.insert(key, value);
            }
        }
        Self::check_references(schema, &tables, &updated)?;
        Self::check_unique(schema, tables.get(schema.table), &updated, Some(id))?;

        if let Some(table) = tables.get_mut(schema.table) {
            table.rows.insert(id, updated.clone());
        }
        Ok(Some(updated))
    }

    async fn delete(&self, schema: &'static ResourceSchema, id: i64) -> Result<Option<Row>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let exists = tables.get(schema.table).map(|t| t.rows.contains_key(&id)).unwrap_or(false);
        if !exists {
            return Ok(None);
        }
        Self::check_not_referenced(schema, &tables, id)?;
        Ok(tables.get_mut(schema.table).and_then(|t| t.rows.remove(&id)))
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
