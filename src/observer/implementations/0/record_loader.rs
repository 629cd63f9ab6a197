// Ring 0: loads the stored row for updates and deletes
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{DataPreparationObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct RecordLoader;

impl Observer for RecordLoader {
    fn name(&self) -> &'static str {
        "RecordLoader"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::DataPreparation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Update | Operation::Delete)
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl DataPreparationObserver for RecordLoader {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        // Already injected by the caller
        if ctx.record.original().is_some() {
            return Ok(());
        }

        let id = ctx
            .record
            .id()
            .ok_or_else(|| ObserverError::BadRequest(format!("{:?} requires a record id", ctx.operation)))?;

        let stored = ctx
            .store
            .find(ctx.schema, id)
            .await?
            .ok_or_else(|| ObserverError::NotFound(format!("{} {} not found", ctx.schema.label, id)))?;

        ctx.record.inject(stored);
        Ok(())
    }
}
