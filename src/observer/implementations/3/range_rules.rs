// Ring 3: ordered date and time pairs, positive payment amounts
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::observer::context::ObserverContext;
use crate::observer::error::{FieldErrors, ObserverError};
use crate::observer::traits::{BusinessObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::{parse_date, parse_datetime, parse_time, value_as_decimal, Operation};

/// (table, start column, end column, message)
const ORDERED_PAIRS: &[(&str, &str, &str, &str)] = &[
    ("projects", "start_date", "end_date", "The end date must be a date after or equal to the start date."),
    ("events", "start_date", "end_date", "The end date must be a date after or equal to the start date."),
    (
        "employees",
        "hire_date",
        "termination_date",
        "The termination date must be a date after or equal to the hire date.",
    ),
    ("attendances", "check_in", "check_out", "The check out time must not be earlier than the check in time."),
];

#[derive(Default)]
pub struct RangeRules;

impl Observer for RangeRules {
    fn name(&self) -> &'static str {
        "RangeRules"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Business
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.table == "payments" || ORDERED_PAIRS.iter().any(|(table, ..)| *table == schema.table)
    }
}

/// Compares two stored values of the same column type
fn out_of_order(start: &Value, end: &Value) -> bool {
    if let (Some(a), Some(b)) = (parse_time(start), parse_time(end)) {
        return b < a;
    }
    if let (Some(a), Some(b)) = (parse_datetime(start), parse_datetime(end)) {
        return b < a;
    }
    match (parse_date(start), parse_date(end)) {
        (Some(a), Some(b)) => b < a,
        _ => false,
    }
}

#[async_trait]
impl BusinessObserver for RangeRules {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let mut errors = FieldErrors::new();

        for (_, start, end, message) in ORDERED_PAIRS.iter().filter(|(table, ..)| *table == ctx.schema.table) {
            if !ctx.record.is_written(start) && !ctx.record.is_written(end) {
                continue;
            }
            if let (Some(a), Some(b)) = (ctx.record.get(start), ctx.record.get(end)) {
                if out_of_order(a, b) {
                    errors.insert(end.to_string(), message.to_string());
                }
            }
        }

        if ctx.schema.table == "payments" && ctx.record.is_written("amount") {
            let amount = ctx.record.get("amount").and_then(value_as_decimal);
            if matches!(amount, Some(a) if a <= Decimal::ZERO) {
                errors.insert("amount".to_string(), "The amount must be greater than 0.".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ObserverError::invalid(errors))
        }
    }
}
