use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};

use crate::config::NotificationConfig;
use crate::database::{DatabaseError, Store};
use crate::filter::FilterData;
use crate::notify::mailer::{MailError, MailMessage, Mailer};
use crate::notify::templates::{Rendered, Template};
use crate::resources::registry::{NOTIFICATIONS, USERS};
use crate::types::{row_id, Row};

#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    pub user_id: i64,
    pub email: Option<String>,
}

impl Recipient {
    fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            user_id: row_id(row)?,
            email: row.get("email").and_then(Value::as_str).map(str::to_string),
        })
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanoutReport {
    pub delivered: Vec<i64>,
    pub failed: Vec<i64>,
}

impl FanoutReport {
    pub fn recipients(&self) -> usize {
        self.delivered.len() + self.failed.len()
    }

    fn merge(&mut self, other: FanoutReport) {
        self.delivered.extend(other.delivered);
        self.failed.extend(other.failed);
    }
}

#[derive(Debug, thiserror::Error)]
enum DeliveryError {
    #[error("storing notification: {0}")]
    Store(#[from] DatabaseError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Delivers rendered templates to users: one stored notification row and
/// one mail per recipient. Recipients are delivered independently; a
/// failure is logged and counted, never returned.
pub struct NotificationDispatcher {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    config: NotificationConfig,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, config: NotificationConfig) -> Self {
        Self { store, mailer, config }
    }

    /// Every user whose role is in the configured admin set
    pub async fn admin_recipients(&self) -> Result<Vec<Recipient>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({ "role": { "$in": self.config.admin_roles } })),
            ..Default::default()
        };
        let rows = self.store.select(&USERS, filter).await?;
        Ok(rows.iter().filter_map(Recipient::from_row).collect())
    }

    pub async fn user_recipient(&self, user_id: i64) -> Result<Option<Recipient>, DatabaseError> {
        Ok(self.store.find(&USERS, user_id).await?.as_ref().and_then(Recipient::from_row))
    }

    pub async fn notify_user(&self, user_id: i64, template: &Template) -> FanoutReport {
        match self.user_recipient(user_id).await {
            Ok(Some(recipient)) => self.deliver(vec![recipient], template).await,
            Ok(None) => {
                tracing::warn!("Notification '{}' skipped: user {} not found", template.kind(), user_id);
                FanoutReport { delivered: vec![], failed: vec![user_id] }
            }
            Err(e) => {
                tracing::error!("Notification '{}' to user {} failed: {}", template.kind(), user_id, e);
                FanoutReport { delivered: vec![], failed: vec![user_id] }
            }
        }
    }

    /// `user_template` to the acting user and `admin_template` to every
    /// admin other than that user
    pub async fn notify_with_admins(
        &self,
        user_id: Option<i64>,
        user_template: &Template,
        admin_template: &Template,
    ) -> FanoutReport {
        let admins = match self.admin_recipients().await {
            Ok(admins) => admins,
            Err(e) => {
                tracing::error!("Loading admin recipients for '{}' failed: {}", admin_template.kind(), e);
                Vec::new()
            }
        };
        let admins: Vec<Recipient> = admins.into_iter().filter(|r| Some(r.user_id) != user_id).collect();

        let (mut report, admin_report) = match user_id {
            Some(id) => futures::join!(self.notify_user(id, user_template), self.deliver(admins, admin_template)),
            None => (FanoutReport::default(), self.deliver(admins, admin_template).await),
        };
        report.merge(admin_report);
        tracing::info!(
            "Fan-out '{}' reached {} users ({} failed)",
            user_template.kind(),
            report.delivered.len(),
            report.failed.len()
        );
        report
    }

    /// One delivery per distinct recipient, run concurrently
    pub async fn deliver(&self, recipients: Vec<Recipient>, template: &Template) -> FanoutReport {
        let rendered = template.render(&self.config.portal_url);
        let mut seen = BTreeSet::new();
        let unique: Vec<Recipient> = recipients.into_iter().filter(|r| seen.insert(r.user_id)).collect();

        let outcomes = join_all(unique.iter().map(|r| self.deliver_one(r, &rendered))).await;

        let mut report = FanoutReport::default();
        for (recipient, outcome) in unique.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.delivered.push(recipient.user_id),
                Err(e) => {
                    tracing::warn!("Notification '{}' to user {} failed: {}", rendered.kind, recipient.user_id, e);
                    report.failed.push(recipient.user_id);
                }
            }
        }
        report
    }

    async fn deliver_one(&self, recipient: &Recipient, rendered: &Rendered) -> Result<(), DeliveryError> {
        let mut row = Row::new();
        row.insert("user_id".to_string(), Value::from(recipient.user_id));
        row.insert("type".to_string(), Value::from(rendered.kind));
        row.insert("title".to_string(), Value::from(rendered.title.clone()));
        row.insert("message".to_string(), Value::from(rendered.message.clone()));
        row.insert("data".to_string(), rendered.data.clone());
        row.insert("read_at".to_string(), Value::Null);
        self.store.insert(&NOTIFICATIONS, row).await?;

        if let Some(ref email) = recipient.email {
            self.mailer
                .send(MailMessage {
                    from: self.config.mail_from.clone(),
                    to: email.clone(),
                    subject: rendered.title.clone(),
                    body: rendered.message.clone(),
                })
                .await?;
        }
        Ok(())
    }
}
