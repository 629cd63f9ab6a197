// Ring 3: status writes must follow the declared transition table
use async_trait::async_trait;

use crate::domain::status::{check_transition, has_transition_table, TransitionError};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{BusinessObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct StatusTransition;

impl Observer for StatusTransition {
    fn name(&self) -> &'static str {
        "StatusTransition"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Update
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        has_transition_table(schema.table)
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl BusinessObserver for StatusTransition {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if !ctx.record.changed("status") {
            return Ok(());
        }
        let from = ctx.record.get_original("status").and_then(|v| v.as_str()).unwrap_or("pending");
        let to = ctx.status().unwrap_or_default();

        match check_transition(ctx.schema.table, from, to) {
            Ok(()) => Ok(()),
            Err(TransitionError::NotAllowed { from, to, allowed }) => {
                let hint = if allowed.is_empty() {
                    format!("'{}' is a final status", from)
                } else {
                    format!("allowed: {}", allowed.join(", "))
                };
                Err(ObserverError::field(
                    "status",
                    format!("Cannot change status from '{}' to '{}' ({}).", from, to, hint),
                ))
            }
            Err(e) => Err(ObserverError::field("status", e.to_string())),
        }
    }
}
