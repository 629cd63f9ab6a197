// Ring 9: Welcome notification after portal onboarding
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::Actor;
use crate::domain::Citizen;
use crate::notify::{NotificationDispatcher, Template};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{NotificationObserver, Observer, ObserverRing};
use crate::resources::ResourceSchema;
use crate::types::Operation;

pub struct WelcomeNotifier {
    dispatcher: Arc<NotificationDispatcher>,
}

impl WelcomeNotifier {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

impl Observer for WelcomeNotifier {
    fn name(&self) -> &'static str {
        "WelcomeNotifier"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Notification
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op == Operation::Create
    }

    fn applies_to_schema(&self, schema: &ResourceSchema) -> bool {
        schema.table == "citizens"
    }

    fn applies_to_actor(&self, actor: &Actor) -> bool {
        actor.is_portal()
    }
}

#[async_trait]
impl NotificationObserver for WelcomeNotifier {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        let Some(citizen) = Citizen::from_row(ctx.row()) else {
            return Ok(());
        };
        if let Some(user_id) = citizen.user_id {
            let template = Template::Welcome { name: citizen.full_name() };
            self.dispatcher.notify_user(user_id, &template).await;
        }
        Ok(())
    }
}
