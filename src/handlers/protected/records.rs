use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use serde_json::Value;

use crate::api::{query::parse_with, ListQuery};
use crate::auth::Actor;
use crate::handlers::{discard_document_file, json_body, warnings_meta, Resource};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::resources::registry::DOCUMENTS;
use crate::server::AppState;
use crate::services::RecordService;
use crate::types::Row;

fn staff(user: &AuthUser) -> Actor {
    Actor::staff(user.id, user.role.clone())
}

/// GET /api/:resource - paginated listing with filters, search and sort
pub async fn index(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Row>> {
    let query = ListQuery::parse(schema, &params, &state.config.api)?;
    let (rows, meta) = RecordService::new(schema, state.store.clone()).list(&query).await?;
    Ok(ApiResponse::success(rows).with_meta(meta))
}

/// POST /api/:resource
pub async fn store(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let result = state.pipeline.create(schema, staff(&user), json_body(payload)?).await?;
    let mut response = ApiResponse::created(result.record).with_message(format!("{} created successfully", schema.label));
    response.meta = warnings_meta(&result.warnings);
    Ok(response)
}

/// GET /api/:resource/:id, `?with=` loads named relations
pub async fn show(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Row> {
    let with = parse_with(schema, params.get("with"))?;
    let row = RecordService::new(schema, state.store.clone()).show(id, &with).await?;
    Ok(ApiResponse::success(row))
}

/// PUT|PATCH /api/:resource/:id - partial update, omitted fields keep their values
pub async fn update(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Row> {
    let result = state.pipeline.update(schema, staff(&user), id, json_body(payload)?).await?;
    let mut response = ApiResponse::success(result.record).with_message(format!("{} updated successfully", schema.label));
    response.meta = warnings_meta(&result.warnings);
    Ok(response)
}

/// DELETE /api/:resource/:id, a document's stored file goes with it
pub async fn destroy(
    State(state): State<AppState>,
    Extension(Resource(schema)): Extension<Resource>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Row> {
    let result = state.pipeline.delete(schema, staff(&user), id).await?;
    if schema.table == DOCUMENTS.table {
        discard_document_file(state.storage.as_ref(), &result.record).await;
    }
    Ok(ApiResponse::success(result.record).with_message(format!("{} deleted successfully", schema.label)))
}
