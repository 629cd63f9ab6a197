use async_trait::async_trait;
use serde_json::Value;

use crate::database::manager::DatabaseError;
use crate::filter::FilterData;
use crate::resources::ResourceSchema;
use crate::types::Row;

/// Persistence seam shared by the Postgres and in-memory backends.
///
/// Rows travel as JSON objects keyed by column name. Writes return the
/// stored row as the backend sees it after the statement.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, schema: &'static ResourceSchema, filter: FilterData) -> Result<Vec<Row>, DatabaseError>;

    async fn count(&self, schema: &'static ResourceSchema, filter: FilterData) -> Result<i64, DatabaseError>;

    async fn find(&self, schema: &'static ResourceSchema, id: i64) -> Result<Option<Row>, DatabaseError> {
        let mut rows = self.select(schema, FilterData::where_eq("id", id)).await?;
        Ok(rows.pop())
    }

    async fn insert(&self, schema: &'static ResourceSchema, row: Row) -> Result<Row, DatabaseError>;

    /// Applies `changes` to row `id` only while the row also satisfies
    /// `guard`; the check and the write are one atomic step. `None` means
    /// no row matched.
    async fn update(
        &self,
        schema: &'static ResourceSchema,
        id: i64,
        changes: Row,
        guard: Option<Value>,
    ) -> Result<Option<Row>, DatabaseError>;

    async fn delete(&self, schema: &'static ResourceSchema, id: i64) -> Result<Option<Row>, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Short backend name for logs and the health endpoint
    fn backend(&self) -> &'static str;
}
