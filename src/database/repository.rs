use serde_json::{json, Value};
use std::sync::Arc;

use crate::database::manager::DatabaseError;
use crate::database::store::Store;
use crate::filter::FilterData;
use crate::resources::ResourceSchema;
use crate::types::Row;

/// Read helpers for one resource over any store
pub struct Repository {
    schema: &'static ResourceSchema,
    store: Arc<dyn Store>,
}

impl Repository {
    pub fn new(schema: &'static ResourceSchema, store: Arc<dyn Store>) -> Self {
        Self { schema, store }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<Row>, DatabaseError> {
        self.store.select(self.schema, filter_data).await
    }

    pub async fn select_one(&self, mut filter_data: FilterData) -> Result<Option<Row>, DatabaseError> {
        filter_data.limit = Some(1);
        Ok(self.store.select(self.schema, filter_data).await?.into_iter().next())
    }

    pub async fn select_404(&self, id: i64) -> Result<Row, DatabaseError> {
        self.store
            .find(self.schema, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {} not found", self.schema.label, id)))
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        self.store.count(self.schema, filter_data).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.store.find(self.schema, id).await?.is_some())
    }

    /// Whether another row already holds `value` in `column`
    pub async fn is_taken(&self, column: &str, value: &Value, except_id: Option<i64>) -> Result<bool, DatabaseError> {
        let mut clause = serde_json::Map::new();
        clause.insert(column.to_string(), value.clone());
        if let Some(id) = except_id {
            clause.insert("id".to_string(), json!({ "$ne": id }));
        }
        let filter = FilterData { where_clause: Some(Value::Object(clause)), ..Default::default() };
        Ok(self.count(filter).await? > 0)
    }
}
