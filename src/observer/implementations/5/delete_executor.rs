// Ring 5: Delete Executor
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{DatabaseObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct DeleteExecutor;

impl Observer for DeleteExecutor {
    fn name(&self) -> &'static str {
        "DeleteExecutor"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Database
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Delete
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }
}

#[async_trait]
impl DatabaseObserver for DeleteExecutor {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let id = ctx
            .record
            .id()
            .ok_or_else(|| ObserverError::BadRequest("Delete requires a record id".to_string()))?;

        match ctx.store.delete(ctx.schema, id).await? {
            Some(row) => {
                ctx.result = Some(row);
                Ok(())
            }
            None => Err(ObserverError::NotFound(format!("{} {} not found", ctx.schema.label, id))),
        }
    }
}
