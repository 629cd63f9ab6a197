use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Extension, Json,
};
use serde_json::Value;

use super::current_citizen;
use crate::api::query::parse_portal_with;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::resources::registry::CITIZENS;
use crate::server::AppState;
use crate::services::{portal_service, relation_service::load_relations};
use crate::types::Row;

/// GET /portal/profile
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Row> {
    let (citizen, _) = current_citizen(&state, &user).await?;
    let with = parse_portal_with(&CITIZENS, params.get("with"))?;
    let mut rows = [citizen.row];
    load_relations(&state.store, &with, &mut rows).await?;
    let [row] = rows;
    Ok(ApiResponse::success(row))
}

/// POST /portal/profile - first-time onboarding binds a profile to the account
pub async fn onboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let result = portal_service::onboard(&state.pipeline, &user, json_body(payload)?).await?;
    Ok(ApiResponse::created(result.record).with_message("Profile created successfully"))
}

/// PUT /portal/profile
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let (citizen, actor) = current_citizen(&state, &user).await?;
    let result = state.pipeline.update(&CITIZENS, actor, citizen.id, json_body(payload)?).await?;
    Ok(ApiResponse::success(result.record).with_message("Profile updated successfully"))
}
