// Ring 4: hours_worked follows check-in and check-out
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::attendance::hours_worked;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{EnrichmentObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::{decimal_value, parse_time, Operation};

#[derive(Default)]
pub struct AttendanceHours;

impl Observer for AttendanceHours {
    fn name(&self) -> &'static str {
        "AttendanceHours"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.table == "attendances"
    }
}

#[async_trait]
impl EnrichmentObserver for AttendanceHours {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let touched = ctx.record.is_written("check_in") || ctx.record.is_written("check_out");
        if ctx.operation == Operation::Update && !touched {
            return Ok(());
        }

        let check_in = ctx.record.get("check_in").and_then(parse_time);
        let check_out = ctx.record.get("check_out").and_then(parse_time);
        let hours = match (check_in, check_out) {
            (Some(check_in), Some(check_out)) => hours_worked(check_in, check_out)
                .map(decimal_value)
                .map_err(|e| ObserverError::field("check_out", e.to_string()))?,
            _ => Value::Null,
        };
        ctx.set("hours_worked", hours);
        Ok(())
    }
}
