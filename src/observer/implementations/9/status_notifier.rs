// Ring 9: status changes on requests, permits and payments
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::Channel;
use crate::domain::Citizen;
use crate::notify::{NotificationDispatcher, Template};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{NotificationObserver, Observer, ObserverRing};
use crate::resources::registry::CITIZENS;
use crate::resources::ResourceSchema;
use crate::types::{value_as_i64, Operation, Row};

/// A payment settled by its citizen goes to the payer and every admin.
/// Any other staff-made status change goes to the owning citizen.
pub struct StatusNotifier {
    dispatcher: Arc<NotificationDispatcher>,
}

impl StatusNotifier {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    async fn owner(&self, ctx: &ObserverContext, row: &Row) -> Result<Option<Citizen>, ObserverError> {
        let Some(citizen_id) = row.get("citizen_id").and_then(value_as_i64) else {
            return Ok(None);
        };
        Ok(ctx.store.find(&CITIZENS, citizen_id).await?.and_then(Citizen::from_row))
    }

    async fn payment_received(&self, ctx: &ObserverContext, row: &Row) -> Result<(), ObserverError> {
        let Some(payer) = Template::for_row("payments", row) else {
            return Ok(());
        };
        let citizen_name = self
            .owner(ctx, row)
            .await?
            .map(|c| c.full_name())
            .unwrap_or_else(|| "A citizen".to_string());
        let admin = Template::AdminPayment {
            payment_id: ctx.record.id().unwrap_or_default(),
            reference_number: row.get("reference_number").and_then(|v| v.as_str()).map(str::to_string),
            amount: row.get("amount").cloned().unwrap_or_default(),
            citizen_name,
        };
        self.dispatcher.notify_with_admins(ctx.actor.user_id, &payer, &admin).await;
        Ok(())
    }
}

impl Observer for StatusNotifier {
    fn name(&self) -> &'static str {
        "StatusNotifier"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Notification
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Update
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        matches!(schema.table, "requests" | "permits" | "payments")
    }
}

#[async_trait]
impl NotificationObserver for StatusNotifier {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !ctx.record.changed("status") {
            return Ok(());
        }
        let row = ctx.row();

        match ctx.actor.channel {
            Channel::Portal if ctx.schema.table == "payments" && ctx.enters_status("completed") => {
                self.payment_received(ctx, &row).await
            }
            Channel::Admin => {
                let Some(template) = Template::for_row(ctx.schema.table, &row) else {
                    return Ok(());
                };
                match self.owner(ctx, &row).await?.and_then(|c| c.user_id) {
                    Some(user_id) => {
                        self.dispatcher.notify_user(user_id, &template).await;
                    }
                    None => tracing::debug!(
                        "No portal user for {} {:?}; status change not notified",
                        ctx.schema.table,
                        row.get("id")
                    ),
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
