// Ring 0: column defaults for values a create leaves out
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{DataPreparationObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct DefaultValues;

impl Observer for DefaultValues {
    fn name(&self) -> &'static str {
        "DefaultValues"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::DataPreparation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.columns.iter().any(|c| c.default.is_some())
    }
}

#[async_trait]
impl DataPreparationObserver for DefaultValues {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        for column in ctx.schema.columns {
            if let Some(default) = column.default {
                ctx.record.set_if_empty(column.name, default.to_value());
            }
        }
        Ok(())
    }
}
