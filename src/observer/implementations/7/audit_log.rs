// Ring 7: Audit Log - one structured line per committed write
use async_trait::async_trait;

use crate::auth::Actor;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{AuditObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::{row_id, Operation};

#[derive(Default)]
pub struct AuditLog;

impl Observer for AuditLog {
    fn name(&self) -> &'static str {
        "AuditLog"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Audit
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }

    fn applies_to_actor(&self, actor: &Actor) -> bool {
        !actor.is_system()
    }
}

#[async_trait]
impl AuditObserver for AuditLog {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let id = ctx.result.as_ref().and_then(row_id).or_else(|| ctx.record.id());
        let changed: Vec<String> = match ctx.operation {
            Operation::Delete => Vec::new(),
            _ => ctx.record.changed_fields().into_iter().collect(),
        };

        tracing::info!(
            target: "audit",
            table = ctx.schema.table,
            id = ?id,
            operation = ?ctx.operation,
            user_id = ?ctx.actor.user_id,
            role = %ctx.actor.role,
            channel = ?ctx.actor.channel,
            changed = ?changed,
            "record {:?}",
            ctx.operation
        );
        Ok(())
    }
}
