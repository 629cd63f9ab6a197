use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::database::{DatabaseError, Store};
use crate::error::ApiError;
use crate::resources::registry::USERS;
use crate::server::AppState;
use crate::types::Row;

use super::auth::AuthUser;

/// Keeps the local `users` mirror in step with the token's claims, so
/// notifications can find the account by id, email and role
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    sync_user(state.store.as_ref(), &auth_user).await?;
    tracing::debug!("User validation successful: {} ({}) as {}", auth_user.name, auth_user.id, auth_user.role);

    Ok(next.run(request).await)
}

pub async fn sync_user(store: &dyn Store, user: &AuthUser) -> Result<Row, DatabaseError> {
    let wanted: Row = [("name", &user.name), ("email", &user.email), ("role", &user.role)]
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
        .collect();

    match store.find(&USERS, user.id).await? {
        None => {
            let mut row = wanted;
            row.insert("id".to_string(), Value::from(user.id));
            tracing::info!("Mirroring new user {} ({})", user.id, user.email);
            store.insert(&USERS, row).await
        }
        Some(existing) => {
            let stale: Row = wanted
                .into_iter()
                .filter(|(key, value)| existing.get(key) != Some(value))
                .collect();
            if stale.is_empty() {
                return Ok(existing);
            }
            tracing::debug!("Refreshing user {} fields {:?}", user.id, stale.keys().collect::<Vec<_>>());
            Ok(store.update(&USERS, user.id, stale, None).await?.unwrap_or(existing))
        }
    }
}

/// Admin console routes are limited to staff roles
pub async fn require_staff_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.role.clone())
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required"))?;

    if !state.config.is_staff_role(&role) {
        tracing::warn!("Role '{}' refused on the admin API", role);
        return Err(ApiError::forbidden("This area is restricted to staff accounts"));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn user(role: &str) -> AuthUser {
        AuthUser { id: 7, name: "Ada".into(), email: "ada@example.gov".into(), role: role.into() }
    }

    #[tokio::test]
    async fn users_are_mirrored_and_refreshed() {
        let store = MemoryStore::new();
        let row = sync_user(&store, &user("citizen")).await.unwrap();
        assert_eq!(row["id"], json!(7));
        assert_eq!(row["role"], json!("citizen"));

        let row = sync_user(&store, &user("admin")).await.unwrap();
        assert_eq!(row["role"], json!("admin"));
        assert_eq!(store.count(&USERS, Default::default()).await.unwrap(), 1);
    }
}
