// Ring 5: Create Executor - inserts the prepared row
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{DatabaseObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct CreateExecutor;

impl Observer for CreateExecutor {
    fn name(&self) -> &'static str {
        "CreateExecutor"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Database
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }
}

#[async_trait]
impl DatabaseObserver for CreateExecutor {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let row = ctx.store.insert(ctx.schema, ctx.record.to_write()).await?;
        tracing::debug!("Inserted into {}: id={:?}", ctx.schema.table, row.get("id"));
        ctx.result = Some(row);
        Ok(())
    }
}
