// Ring 4: generated permit and payment reference numbers
use async_trait::async_trait;

use crate::domain::numbers::{self, NumberKind};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{EnrichmentObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct ReferenceNumbers;

impl ReferenceNumbers {
    fn target(table: &str) -> Option<(&'static str, NumberKind)> {
        match table {
            "permits" => Some(("permit_number", NumberKind::Permit)),
            "payments" => Some(("reference_number", NumberKind::PaymentReference)),
            _ => None,
        }
    }
}

impl Observer for ReferenceNumbers {
    fn name(&self) -> &'static str {
        "ReferenceNumbers"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        Self::target(schema.table).is_some()
    }
}

#[async_trait]
impl EnrichmentObserver for ReferenceNumbers {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if let Some((column, kind)) = Self::target(ctx.schema.table) {
            ctx.record.set_if_empty(column, numbers::generate(kind).into());
        }
        Ok(())
    }
}
