use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::notification_service;

/// POST /api/users/:id/password-reset with `{"token": "..."}`.
/// Tokens are issued by the authentication service; this only delivers the mail.
pub async fn password_reset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    let body = json_body(payload)?;
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unprocessable_entity("token", "The token field is required."))?
        .to_string();

    let report = notification_service::send_password_reset(state.store.as_ref(), &state.dispatcher, id, token).await?;
    Ok(ApiResponse::success(json!({ "user_id": id, "delivered": report.delivered }))
        .with_message("Password reset notification sent"))
}
