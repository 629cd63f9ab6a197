use std::sync::Arc;

use serde_json::{json, Value};

use crate::api::{ListQuery, PageMeta};
use crate::database::{DatabaseError, Repository, Store};
use crate::filter::FilterData;
use crate::resources::{Relation, ResourceSchema};
use crate::services::relation_service::load_relations;
use crate::types::Row;

/// Reads for one resource: paged lists and single rows, with relations
pub struct RecordService {
    repository: Repository,
    store: Arc<dyn Store>,
}

impl RecordService {
    pub fn new(schema: &'static ResourceSchema, store: Arc<dyn Store>) -> Self {
        Self { repository: Repository::new(schema, store.clone()), store }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<(Vec<Row>, PageMeta), DatabaseError> {
        let (rows, total) = futures::try_join!(
            self.repository.select_any(query.page_filter()),
            self.repository.count(query.count_filter()),
        )?;
        let mut rows = rows;
        load_relations(&self.store, &query.with, &mut rows).await?;
        Ok((rows, query.meta(total)))
    }

    pub async fn show(&self, id: i64, with: &[&'static Relation]) -> Result<Row, DatabaseError> {
        let row = self.repository.select_404(id).await?;
        self.attach(row, with).await
    }

    /// Row `id` only if it also matches `scope`; otherwise not found
    pub async fn show_scoped(&self, id: i64, scope: Value, with: &[&'static Relation]) -> Result<Row, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({ "$and": [{ "id": id }, scope] })),
            ..Default::default()
        };
        let row = self.repository.select_one(filter).await?.ok_or_else(|| {
            DatabaseError::NotFound(format!("{} {} not found", self.repository.schema().label, id))
        })?;
        self.attach(row, with).await
    }

    async fn attach(&self, row: Row, with: &[&'static Relation]) -> Result<Row, DatabaseError> {
        let mut rows = vec![row];
        load_relations(&self.store, with, &mut rows).await?;
        Ok(rows.pop().unwrap_or_default())
    }
}
