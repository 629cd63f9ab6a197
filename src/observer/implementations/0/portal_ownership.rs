// Ring 0: portal creates belong to the caller
use async_trait::async_trait;

use crate::auth::Actor;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{DataPreparationObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct PortalOwnership;

impl Observer for PortalOwnership {
    fn name(&self) -> &'static str {
        "PortalOwnership"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::DataPreparation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.table == "citizens" || schema.is_citizen_owned()
    }

    fn applies_to_actor(&self, actor: &Actor) -> bool {
        actor.is_portal()
    }
}

#[async_trait]
impl DataPreparationObserver for PortalOwnership {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if ctx.schema.table == "citizens" {
            let user_id = ctx
                .actor
                .user_id
                .ok_or_else(|| ObserverError::Forbidden("Onboarding requires a signed-in user".to_string()))?;
            ctx.set("user_id", user_id);
            ctx.set("is_verified", false);
        } else {
            let citizen_id = ctx
                .actor
                .citizen_id
                .ok_or_else(|| ObserverError::Forbidden("Complete your citizen profile first".to_string()))?;
            ctx.set("citizen_id", citizen_id);
        }
        Ok(())
    }
}
