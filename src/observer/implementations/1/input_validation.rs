// Ring 1: column types, enums, bounds and required fields
use async_trait::async_trait;
use serde_json::Value;

use crate::observer::context::ObserverContext;
use crate::observer::error::{FieldErrors, ObserverError};
use crate::observer::traits::{InputValidationObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

#[derive(Default)]
pub struct InputValidation;

impl Observer for InputValidation {
    fn name(&self) -> &'static str {
        "InputValidation"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, _schema: &ResourceSchema) -> bool {
        true
    }

    fn priority(&self) -> u8 {
        10
    }
}

pub(crate) fn label(field: &str) -> String {
    field.replace('_', " ")
}

#[async_trait]
impl InputValidationObserver for InputValidation {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let mut errors = FieldErrors::new();
        let system = ctx.actor.is_system();

        for key in ctx.record.written_keys() {
            let Some(column) = ctx.schema.column(&key) else {
                if ctx.schema.column_type(&key).is_none() {
                    tracing::debug!("Dropping unknown column '{}' on {}", key, ctx.schema.table);
                }
                ctx.record.remove(&key);
                ctx.submitted.remove(&key);
                continue;
            };

            if column.computed && !system && ctx.submitted.contains(&key) {
                ctx.record.remove(&key);
                ctx.submitted.remove(&key);
                continue;
            }

            let raw = match ctx.record.written(&key) {
                Some(Value::String(s)) if s.trim().is_empty() => Value::Null,
                Some(value) => value.clone(),
                None => continue,
            };

            match column.validate(&raw) {
                Ok(normalized) => {
                    ctx.record.set(key.as_str(), normalized);
                }
                Err(message) => {
                    errors.insert(key.clone(), format!("The {} field {}.", label(&key), message));
                }
            }
        }

        for column in ctx.schema.columns.iter().filter(|c| c.required) {
            let missing = match ctx.operation {
                Operation::Create => ctx.record.get(column.name).is_none(),
                _ => ctx.record.is_written(column.name) && ctx.record.get(column.name).is_none(),
            };
            if missing {
                errors
                    .entry(column.name.to_string())
                    .or_insert_with(|| format!("The {} field is required.", label(column.name)));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ObserverError::invalid(errors))
        }
    }
}
