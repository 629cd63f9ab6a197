use serde_json::Value;

use crate::auth::Actor;
use crate::database::{DatabaseError, Store};
use crate::domain::{Citizen, NeedsOnboarding};
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::observer::{ObserverError, ObserverPipeline, ObserverResult};
use crate::resources::registry::CITIZENS;

/// The caller's citizen profile. The outer error is the store failing; the
/// inner one is an account that has not been onboarded yet.
pub async fn find_citizen(store: &dyn Store, user_id: i64) -> Result<Result<Citizen, NeedsOnboarding>, DatabaseError> {
    let filter = FilterData { limit: Some(1), ..FilterData::where_eq("user_id", user_id) };
    let row = store.select(&CITIZENS, filter).await?.into_iter().next();
    Ok(row.and_then(Citizen::from_row).ok_or(NeedsOnboarding { user_id }))
}

/// Actor for a portal caller with an onboarded profile
pub fn citizen_actor(user: &AuthUser, citizen: &Citizen) -> Actor {
    Actor::citizen(user.id, user.role.clone(), Some(citizen.id))
}

/// Creates the caller's profile. A second onboarding is a conflict.
pub async fn onboard(pipeline: &ObserverPipeline, user: &AuthUser, mut input: Value) -> Result<ObserverResult, ObserverError> {
    if let Ok(existing) = find_citizen(pipeline.store().as_ref(), user.id).await? {
        return Err(ObserverError::Conflict(format!(
            "A citizen profile ({}) already exists for this account",
            existing.id
        )));
    }

    if let Value::Object(fields) = &mut input {
        let missing_email = fields.get("email").map(Value::is_null).unwrap_or(true);
        if missing_email {
            fields.insert("email".to_string(), Value::String(user.email.clone()));
        }
    }

    let actor = Actor::citizen(user.id, user.role.clone(), None);
    let result = pipeline.create(&CITIZENS, actor, input).await?;
    tracing::info!("User {} onboarded as citizen {:?}", user.id, result.record.get("id"));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::AppConfig;
    use crate::database::MemoryStore;
    use crate::notify::{MemoryMailer, NotificationDispatcher};
    use crate::resources::registry::USERS;

    fn user() -> AuthUser {
        AuthUser { id: 21, name: "Grace".into(), email: "grace@example.gov".into(), role: "citizen".into() }
    }

    async fn pipeline() -> ObserverPipeline {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let row = json!({"id": 21, "name": "Grace", "email": "grace@example.gov", "role": "citizen"});
        store.insert(&USERS, row.as_object().cloned().unwrap()).await.unwrap();
        let dispatcher = Arc::new(NotificationDispatcher::new(
            store.clone(),
            Arc::new(MemoryMailer::new()),
            AppConfig::development().notifications,
        ));
        ObserverPipeline::standard(store, dispatcher, false)
    }

    #[tokio::test]
    async fn missing_profile_needs_onboarding() {
        let pipeline = pipeline().await;
        let lookup = find_citizen(pipeline.store().as_ref(), 21).await.unwrap();
        assert_eq!(lookup.unwrap_err(), NeedsOnboarding { user_id: 21 });
    }

    #[tokio::test]
    async fn onboarding_binds_the_profile_once() {
        let pipeline = pipeline().await;
        let input = json!({"national_id": "GH-1906", "first_name": "Grace", "last_name": "Hopper"});
        let created = onboard(&pipeline, &user(), input.clone()).await.unwrap();
        assert_eq!(created.record["user_id"], json!(21));
        assert_eq!(created.record["email"], json!("grace@example.gov"));
        assert_eq!(created.record["is_verified"], json!(false));

        let citizen = find_citizen(pipeline.store().as_ref(), 21).await.unwrap().unwrap();
        assert_eq!(citizen.full_name(), "Grace Hopper");

        let again = onboard(&pipeline, &user(), input).await;
        assert!(matches!(again, Err(ObserverError::Conflict(_))));
    }
}
