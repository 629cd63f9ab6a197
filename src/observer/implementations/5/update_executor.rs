// Ring 5: Update Executor - writes changed columns, honouring the guard
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{DatabaseObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct UpdateExecutor;

impl Observer for UpdateExecutor {
    fn name(&self) -> &'static str {
        "UpdateExecutor"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Database
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Update
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }
}

#[async_trait]
impl DatabaseObserver for UpdateExecutor {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let id = ctx
            .record
            .id()
            .ok_or_else(|| ObserverError::BadRequest("Update requires a record id".to_string()))?;
        let changes = ctx.record.to_write();
        tracing::debug!(
            "Updating {} {}: fields={:?}",
            ctx.schema.table,
            id,
            changes.keys().collect::<Vec<_>>()
        );

        match ctx.store.update(ctx.schema, id, changes, ctx.guard.clone()).await? {
            Some(row) => {
                ctx.result = Some(row);
                Ok(())
            }
            None if ctx.guard.is_some() => Err(ObserverError::GuardRejected(format!(
                "This {} can no longer be changed",
                ctx.schema.label.to_lowercase()
            ))),
            None => Err(ObserverError::NotFound(format!("{} {} not found", ctx.schema.label, id))),
        }
    }
}
