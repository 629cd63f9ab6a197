// Ring 4: values stamped when a row reaches a lifecycle status
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::numbers::{self, NumberKind};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{EnrichmentObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::{now_value, today_value, value_as_decimal, Operation};

const TABLES: &[&str] = &["requests", "tasks", "payments", "employees", "projects"];

#[derive(Default)]
pub struct LifecycleStamps;

impl Observer for LifecycleStamps {
    fn name(&self) -> &'static str {
        "LifecycleStamps"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        TABLES.contains(&schema.table)
    }
}

#[async_trait]
impl EnrichmentObserver for LifecycleStamps {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        match ctx.schema.table {
            "requests" if ctx.enters_status("completed") => {
                ctx.set("completion_date", now_value());
            }
            "tasks" if ctx.enters_status("completed") => {
                ctx.set("completed_at", now_value());
            }
            "payments" if ctx.enters_status("completed") => {
                ctx.record.set_if_empty("payment_date", now_value());
                ctx.record.set_if_empty("receipt_number", numbers::generate(NumberKind::Receipt).into());
            }
            "employees" if ctx.enters_status("terminated") => {
                ctx.record.set_if_empty("termination_date", today_value());
            }
            "projects" => {
                if ctx.enters_status("completed") {
                    ctx.set("progress_percentage", 100);
                }
                self.warn_over_budget(ctx);
            }
            _ => {}
        }
        Ok(())
    }
}

impl LifecycleStamps {
    fn warn_over_budget(&self, ctx: &mut ObserverContext) {
        if !ctx.record.is_written("spent") && !ctx.record.is_written("budget") {
            return;
        }
        let amount = |key: &str| ctx.record.get(key).and_then(value_as_decimal);
        if let (Some(spent), Some(budget)) = (amount("spent"), amount("budget")) {
            if spent > budget {
                let name = ctx.record.get("name").and_then(Value::as_str).unwrap_or("project").to_string();
                tracing::warn!("Project '{}' spent {} exceeds its budget of {}", name, spent, budget);
                ctx.add_warning(self.name(), format!("Spent {} exceeds the budget of {}", spent, budget));
            }
        }
    }
}
