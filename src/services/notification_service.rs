use serde_json::{json, Value};

use crate::api::{ListQuery, PageMeta};
use crate::database::{DatabaseError, Store};
use crate::notify::{FanoutReport, NotificationDispatcher, Template};
use crate::resources::registry::{NOTIFICATIONS, USERS};
use crate::types::{now_value, value_as_i64, Row};

/// The caller's own notifications, newest first unless sorted otherwise
pub async fn list_for_user(
    store: &dyn Store,
    user_id: i64,
    query: ListQuery,
) -> Result<(Vec<Row>, PageMeta), DatabaseError> {
    let query = query.scoped(json!({ "user_id": user_id }));
    let rows = store.select(&NOTIFICATIONS, query.page_filter()).await?;
    let total = store.count(&NOTIFICATIONS, query.count_filter()).await?;
    Ok((rows, query.meta(total)))
}

/// Stamps `read_at` once; another user's notification is not found
pub async fn mark_read(store: &dyn Store, user_id: i64, id: i64) -> Result<Row, DatabaseError> {
    let not_found = || DatabaseError::NotFound(format!("Notification {} not found", id));
    let row = store
        .find(&NOTIFICATIONS, id)
        .await?
        .filter(|row| row.get("user_id").and_then(value_as_i64) == Some(user_id))
        .ok_or_else(not_found)?;
    if row.get("read_at").map(|v| !v.is_null()).unwrap_or(false) {
        return Ok(row);
    }

    let mut changes = Row::new();
    changes.insert("read_at".to_string(), now_value());
    store.update(&NOTIFICATIONS, id, changes, None).await?.ok_or_else(not_found)
}

/// Sends the reset mail for a token issued by the authentication service
pub async fn send_password_reset(
    store: &dyn Store,
    dispatcher: &NotificationDispatcher,
    user_id: i64,
    token: String,
) -> Result<FanoutReport, DatabaseError> {
    let user = store
        .find(&USERS, user_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", user_id)))?;
    let email = user.get("email").and_then(Value::as_str).unwrap_or_default().to_string();
    Ok(dispatcher.notify_user(user_id, &Template::PasswordReset { email, token }).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::config::AppConfig;
    use crate::database::MemoryStore;

    fn object(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    async fn store_with_notifications() -> MemoryStore {
        let store = MemoryStore::new();
        for id in [1, 2] {
            let user = json!({"id": id, "name": "u", "email": format!("u{}@example.gov", id), "role": "citizen"});
            store.insert(&USERS, object(user)).await.unwrap();
        }
        for user_id in [1, 1, 2] {
            let row = json!({"user_id": user_id, "type": "request", "title": "t", "message": "m"});
            store.insert(&NOTIFICATIONS, object(row)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn users_see_only_their_notifications() {
        let store = store_with_notifications().await;
        let query = ListQuery::parse(&NOTIFICATIONS, &HashMap::new(), &AppConfig::development().api).unwrap();
        let (rows, meta) = list_for_user(&store, 1, query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(meta.total, 2);
        assert!(rows.iter().all(|r| r["user_id"] == json!(1)));
    }

    #[tokio::test]
    async fn marking_read_is_scoped_and_idempotent() {
        let store = store_with_notifications().await;
        let read = mark_read(&store, 1, 1).await.unwrap();
        let stamp = read["read_at"].clone();
        assert!(stamp.is_string());
        assert_eq!(mark_read(&store, 1, 1).await.unwrap()["read_at"], stamp);
        assert!(matches!(mark_read(&store, 2, 1).await, Err(DatabaseError::NotFound(_))));
    }
}
