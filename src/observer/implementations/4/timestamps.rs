// Ring 4: created_at and updated_at
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{EnrichmentObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::{now_value, Operation};

#[derive(Default)]
pub struct Timestamps;

impl Observer for Timestamps {
    fn name(&self) -> &'static str {
        "Timestamps"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }

    fn priority(&self) -> u8 {
        90
    }
}

#[async_trait]
impl EnrichmentObserver for Timestamps {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let now = now_value();
        if ctx.operation == Operation::Create {
            ctx.set("created_at", now.clone());
        }
        ctx.set("updated_at", now);
        Ok(())
    }
}
