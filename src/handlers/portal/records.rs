use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde_json::Value;

use super::{current_citizen, owned_by};
use crate::api::{query::parse_portal_with, ListQuery};
use crate::handlers::{json_body, Resource};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::RecordService;
use crate::types::Row;

/// The caller's own rows of the routed resource
pub async fn index(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Row>> {
    let (citizen, _) = current_citizen(&state, &user).await?;
    let query = ListQuery::parse_portal(schema, &params, &state.config.api)?.scoped(owned_by(&citizen));
    let (rows, meta) = RecordService::new(schema, state.store.clone()).list(&query).await?;
    Ok(ApiResponse::success(rows).with_meta(meta))
}

/// Another citizen's row is reported as not found
pub async fn show(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Row> {
    let (citizen, _) = current_citizen(&state, &user).await?;
    let with = parse_portal_with(schema, params.get("with"))?;
    let row = RecordService::new(schema, state.store.clone())
        .show_scoped(id, owned_by(&citizen), &with)
        .await?;
    Ok(ApiResponse::success(row))
}

/// Submits a request or permit application. Ownership and the initial
/// status are set server-side; admins are notified.
pub async fn store(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let (_, actor) = current_citizen(&state, &user).await?;
    let result = state.pipeline.create(schema, actor, json_body(payload)?).await?;
    Ok(ApiResponse::created(result.record).with_message(format!("{} submitted successfully", schema.label)))
}

/// Edits are limited to the citizen's own rows that are still pending
pub async fn update(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let (_, actor) = current_citizen(&state, &user).await?;
    let result = state.pipeline.update(schema, actor, id, json_body(payload)?).await?;
    Ok(ApiResponse::success(result.record).with_message(format!("{} updated successfully", schema.label)))
}

pub async fn destroy(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Row> {
    let (_, actor) = current_citizen(&state, &user).await?;
    let result = state.pipeline.delete(schema, actor, id).await?;
    Ok(ApiResponse::success(result.record).with_message(format!("{} withdrawn", schema.label)))
}
