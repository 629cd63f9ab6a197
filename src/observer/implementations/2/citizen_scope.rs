// Ring 2: portal callers act only on their own rows and descriptive fields.
// Ownership columns on create are stamped earlier by PortalOwnership.
use async_trait::async_trait;
use serde_json::Value;

use crate::auth::Actor;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SecurityObserver};
use crate::observer::implementations::input_validation::label;
use crate::resources::{registry, ResourceSchema};
use crate::types::{value_as_i64, Operation};

/// Tables whose rows a citizen may change only while still pending
const PENDING_ONLY: &[&str] = &["requests", "permits", "documents"];

#[derive(Default)]
pub struct CitizenScope;

impl Observer for CitizenScope {
    fn name(&self) -> &'static str {
        "CitizenScope"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Security
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }

    fn applies_to_actor(&self, actor: &Actor) -> bool {
        actor.is_portal()
    }

    fn priority(&self) -> u8 {
        10
    }
}

impl CitizenScope {
    fn check_fields(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let onboarding = ctx.operation == Operation::Create && ctx.schema.table == "citizens";
        let denied = ctx.submitted.iter().find(|field| {
            let allowed = ctx.schema.citizen_fields.contains(&field.as_str())
                || (onboarding && field.as_str() == "national_id");
            !allowed
        });
        match denied {
            Some(field) => Err(ObserverError::Forbidden(format!(
                "The {} field cannot be changed from the citizen portal",
                field
            ))),
            None => Ok(()),
        }
    }

    /// Rows a citizen links to (a document's request or permit) must be theirs too
    async fn check_linked_rows(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        for column in ctx.schema.columns.iter().filter(|c| ctx.submitted.contains(c.name)) {
            let Some(target) = column.references.and_then(registry::by_table) else { continue };
            if !target.is_citizen_owned() {
                continue;
            }
            let Some(id) = ctx.record.get(column.name).and_then(value_as_i64) else { continue };
            let owner = ctx
                .store
                .find(target, id)
                .await?
                .and_then(|row| row.get("citizen_id").and_then(value_as_i64));
            if owner.is_none() || owner != ctx.actor.citizen_id {
                return Err(ObserverError::field(column.name, format!("The selected {} is invalid.", label(column.name))));
            }
        }
        Ok(())
    }

    /// Owner of the stored row: the profile itself, or its citizen_id
    fn owner(&self, ctx: &ObserverContext) -> Option<i64> {
        let column = if ctx.schema.table == "citizens" { "id" } else { "citizen_id" };
        ctx.record.get_original(column).and_then(value_as_i64)
    }
}

#[async_trait]
impl SecurityObserver for CitizenScope {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let citizens_table = ctx.schema.table == "citizens";
        if !citizens_table && !ctx.schema.is_citizen_owned() {
            return Err(ObserverError::Forbidden(format!(
                "{} records are not available from the citizen portal",
                ctx.schema.label
            )));
        }

        self.check_fields(ctx)?;
        self.check_linked_rows(ctx).await?;

        if matches!(ctx.operation, Operation::Update | Operation::Delete) {
            if ctx.actor.citizen_id.is_none() || self.owner(ctx) != ctx.actor.citizen_id {
                let id = ctx.record.id().map(Value::from).unwrap_or(Value::Null);
                return Err(ObserverError::NotFound(format!("{} {} not found", ctx.schema.label, id)));
            }
            if PENDING_ONLY.contains(&ctx.schema.table) {
                let status = ctx.record.get_original("status").and_then(Value::as_str);
                if status != Some("pending") {
                    return Err(ObserverError::Forbidden(format!(
                        "Only pending {} records can be changed",
                        ctx.schema.label.to_lowercase()
                    )));
                }
            }
        }
        Ok(())
    }
}
