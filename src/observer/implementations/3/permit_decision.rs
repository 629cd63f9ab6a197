// Ring 3: approval and rejection rules for permits
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::{FieldErrors, ObserverError};
use crate::observer::traits::{BusinessObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::{parse_date, today_value, value_as_str, Operation};

#[derive(Default)]
pub struct PermitDecision;

impl Observer for PermitDecision {
    fn name(&self) -> &'static str {
        "PermitDecision"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.table == "permits"
    }

    fn priority(&self) -> u8 {
        20
    }
}

#[async_trait]
impl BusinessObserver for PermitDecision {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let mut errors = FieldErrors::new();

        if ctx.enters_status("rejected") && ctx.record.get("rejection_reason").and_then(value_as_str).is_none() {
            errors.insert(
                "rejection_reason".to_string(),
                "A rejection reason is required when rejecting a permit.".to_string(),
            );
        }

        if ctx.enters_status("approved") {
            for field in ["fee", "expiry_date"] {
                if ctx.record.get(field).is_none() {
                    errors.insert(field.to_string(), format!("The {} is required to approve a permit.", field.replace('_', " ")));
                }
            }
            ctx.record.set_if_empty("issue_date", today_value());
        }

        let issue = ctx.record.get("issue_date").and_then(parse_date);
        let expiry = ctx.record.get("expiry_date").and_then(parse_date);
        if let (Some(issue), Some(expiry)) = (issue, expiry) {
            if expiry < issue {
                errors.insert(
                    "expiry_date".to_string(),
                    "The expiry date must be a date after or equal to the issue date.".to_string(),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ObserverError::invalid(errors))
        }
    }
}
