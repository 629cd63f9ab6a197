// Ring 1: unique columns and referenced rows
use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::database::Repository;
use crate::observer::context::ObserverContext;
use crate::observer::error::{FieldErrors, ObserverError};
use crate::observer::implementations::input_validation::label;
use crate::observer::traits::{InputValidationObserver, Observer, ObserverRing};
use crate::resources::{registry, ResourceSchema};
use crate::types::{value_as_i64, Operation};

#[derive(Default)]
pub struct IntegrityValidation;

impl Observer for IntegrityValidation {
    fn name(&self) -> &'static str {
        "IntegrityValidation"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.columns.iter().any(|c| c.unique || c.references.is_some())
    }

    fn priority(&self) -> u8 {
        60
    }
}

#[async_trait]
impl InputValidationObserver for IntegrityValidation {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        // Fields that already failed type checks are not looked up
        let invalid: BTreeSet<String> = ctx
            .errors
            .iter()
            .filter_map(|e| match e {
                ObserverError::Validation { field_errors, .. } => Some(field_errors.keys().cloned()),
                _ => None,
            })
            .flatten()
            .collect();

        let mut errors = FieldErrors::new();
        let repository = Repository::new(ctx.schema, ctx.store.clone());
        let self_id = if ctx.operation == Operation::Update { ctx.record.id() } else { None };

        for column in ctx.schema.columns {
            if invalid.contains(column.name) || !ctx.record.changed(column.name) {
                continue;
            }
            let Some(value) = ctx.record.get(column.name).cloned() else { continue };

            if column.unique && repository.is_taken(column.name, &value, self_id).await? {
                errors.insert(column.name.to_string(), format!("The {} has already been taken.", label(column.name)));
                continue;
            }

            if let Some(target) = column.references.and_then(registry::by_table) {
                let exists = match value_as_i64(&value) {
                    Some(id) => Repository::new(target, ctx.store.clone()).exists(id).await?,
                    None => false,
                };
                if !exists {
                    errors.insert(column.name.to_string(), format!("The selected {} is invalid.", label(column.name)));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ObserverError::invalid(errors))
        }
    }
}
