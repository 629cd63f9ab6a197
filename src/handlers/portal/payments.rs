use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use super::current_citizen;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::billing_service::pay_bill;
use crate::types::Row;

/// POST /portal/payments/:id/pay, optionally `{"payment_method": "card"}`.
/// An empty body is accepted.
pub async fn pay(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Bytes,
) -> ApiResult<Row> {
    let (citizen, actor) = current_citizen(&state, &user).await?;

    let payment_method = if body.is_empty() {
        None
    } else {
        let body: Value = serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(e.to_string()))?;
        body.get("payment_method").and_then(Value::as_str).map(str::to_string)
    };

    let result = pay_bill(&state.pipeline, actor, &citizen, id, payment_method).await?;
    Ok(ApiResponse::success(result.record).with_message("Payment completed successfully"))
}
