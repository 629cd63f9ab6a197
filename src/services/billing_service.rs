use serde_json::{json, Value};

use crate::auth::Actor;
use crate::database::Record;
use crate::domain::{Citizen, PaymentStatus, StatusMachine};
use crate::observer::{ObserverError, ObserverPipeline, ObserverResult};
use crate::resources::registry::PAYMENTS;
use crate::types::{value_as_i64, Operation};

/// Settles a payment the citizen owns. The status change is one guarded
/// update, so of two concurrent calls only one can move the row out of a
/// payable status; the other is rejected.
pub async fn pay_bill(
    pipeline: &ObserverPipeline,
    actor: Actor,
    citizen: &Citizen,
    payment_id: i64,
    payment_method: Option<String>,
) -> Result<ObserverResult, ObserverError> {
    let payment = pipeline
        .store()
        .find(&PAYMENTS, payment_id)
        .await?
        .filter(|row| row.get("citizen_id").and_then(value_as_i64) == Some(citizen.id))
        .ok_or_else(|| ObserverError::NotFound(format!("Payment {} not found", payment_id)))?;

    let status = payment.get("status").and_then(Value::as_str).unwrap_or_default();
    let payable = PaymentStatus::parse(status).map(|s| PaymentStatus::PAYABLE.contains(&s)).unwrap_or(false);
    if !payable {
        return Err(ObserverError::GuardRejected(format!("Payment {} is already {}", payment_id, status)));
    }

    let mut record = Record::new(Operation::Update);
    record.set_id(payment_id);
    let payable: Vec<&str> = PaymentStatus::PAYABLE.iter().map(|s| s.as_str()).collect();
    let mut ctx = pipeline
        .context(&PAYMENTS, actor, record)
        .with_guard(json!({ "status": { "$in": payable } }));
    ctx.set("status", PaymentStatus::Completed.as_str());
    if let Some(method) = payment_method {
        ctx.set("payment_method", method);
    }

    let result = pipeline.execute(ctx).await?;
    tracing::info!(
        "Payment {} settled by citizen {}: receipt {:?}",
        payment_id,
        citizen.id,
        result.record.get("receipt_number")
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::AppConfig;
    use crate::database::{MemoryStore, Store};
    use crate::notify::{MemoryMailer, NotificationDispatcher};
    use crate::resources::registry::{CITIZENS, USERS};
    use crate::types::{row_id, Row};

    fn object(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    struct Fixture {
        pipeline: ObserverPipeline,
        mailer: Arc<MemoryMailer>,
        citizen: Citizen,
        payment_id: i64,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        for (id, role) in [(1, "admin"), (2, "super_admin"), (10, "citizen")] {
            let user = json!({"id": id, "name": format!("user {}", id), "email": format!("u{}@example.gov", id), "role": role});
            store.insert(&USERS, object(user)).await.unwrap();
        }
        let citizen = store
            .insert(
                &CITIZENS,
                object(json!({"user_id": 10, "national_id": "N-10", "first_name": "Ada", "last_name": "Lovelace"})),
            )
            .await
            .unwrap();
        let citizen = Citizen::from_row(citizen).unwrap();

        let mailer = Arc::new(MemoryMailer::new());
        let dispatcher =
            Arc::new(NotificationDispatcher::new(store.clone(), mailer.clone(), AppConfig::development().notifications));
        let pipeline = ObserverPipeline::standard(store, dispatcher, false);
        let payment = pipeline
            .create(&PAYMENTS, Actor::staff(1, "admin"), json!({"citizen_id": citizen.id, "type": "tax", "amount": 120.5}))
            .await
            .unwrap();

        Fixture { pipeline, mailer, citizen, payment_id: row_id(&payment.record).unwrap() }
    }

    fn actor(f: &Fixture) -> Actor {
        Actor::citizen(10, "citizen", Some(f.citizen.id))
    }

    #[tokio::test]
    async fn paying_stamps_receipt_and_notifies_payer_and_admins() {
        let f = fixture().await;
        let paid = pay_bill(&f.pipeline, actor(&f), &f.citizen, f.payment_id, Some("card".into())).await.unwrap();

        assert_eq!(paid.record["status"], json!("completed"));
        assert_eq!(paid.record["payment_method"], json!("card"));
        assert!(paid.record["receipt_number"].as_str().unwrap().starts_with("RCP-"));
        assert!(paid.record["payment_date"].is_string());

        let recipients: Vec<String> = f.mailer.sent().into_iter().map(|m| m.to).collect();
        assert_eq!(recipients.len(), 3);
        assert!(recipients.contains(&"u10@example.gov".to_string()));
    }

    #[tokio::test]
    async fn second_payment_is_rejected_and_leaves_the_receipt() {
        let f = fixture().await;
        let first = pay_bill(&f.pipeline, actor(&f), &f.citizen, f.payment_id, None).await.unwrap();
        let second = pay_bill(&f.pipeline, actor(&f), &f.citizen, f.payment_id, None).await;
        assert!(matches!(second, Err(ObserverError::GuardRejected(_))));

        let stored = f.pipeline.store().find(&PAYMENTS, f.payment_id).await.unwrap().unwrap();
        assert_eq!(stored["receipt_number"], first.record["receipt_number"]);
    }

    #[tokio::test]
    async fn concurrent_payments_settle_once() {
        let f = fixture().await;
        let (a, b) = tokio::join!(
            pay_bill(&f.pipeline, actor(&f), &f.citizen, f.payment_id, None),
            pay_bill(&f.pipeline, actor(&f), &f.citizen, f.payment_id, None),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[tokio::test]
    async fn other_citizens_payments_are_not_found() {
        let f = fixture().await;
        let stranger = Citizen { id: f.citizen.id + 100, ..f.citizen.clone() };
        let result = pay_bill(&f.pipeline, actor(&f), &stranger, f.payment_id, None).await;
        assert!(matches!(result, Err(ObserverError::NotFound(_))));
    }
}
