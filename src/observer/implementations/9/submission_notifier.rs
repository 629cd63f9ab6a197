// Ring 9: citizen submissions reach the citizen and every admin
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::Actor;
use crate::notify::{NotificationDispatcher, Template};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{NotificationObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

pub struct SubmissionNotifier {
    dispatcher: Arc<NotificationDispatcher>,
}

impl SubmissionNotifier {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl Observer for SubmissionNotifier {
    fn name(&self) -> &'static str {
        "SubmissionNotifier"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Notification
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        matches!(schema.table, "requests" | "permits")
    }

    fn applies_to_actor(&self, actor: &Actor) -> bool {
        actor.is_portal()
    }
}

#[async_trait]
impl NotificationObserver for SubmissionNotifier {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let row = ctx.row();
        let Some(template) = Template::for_row(ctx.schema.table, &row) else {
            return Ok(());
        };
        self.dispatcher.notify_with_admins(ctx.actor.user_id, &template, &template).await;
        Ok(())
    }
}
