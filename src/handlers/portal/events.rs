use std::collections::HashMap;

use axum::extract::{Query, State};
use serde_json::json;

use crate::api::ListQuery;
use crate::middleware::{ApiResponse, ApiResult};
use crate::resources::registry::EVENTS;
use crate::server::AppState;
use crate::services::RecordService;
use crate::types::Row;

/// GET /portal/events - public events that are not cancelled
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Row>> {
    let query = ListQuery::parse_portal(&EVENTS, &params, &state.config.api)?
        .scoped(json!({ "is_public": true, "status": { "$ne": "cancelled" } }));
    let (rows, meta) = RecordService::new(&EVENTS, state.store.clone()).list(&query).await?;
    Ok(ApiResponse::success(rows).with_meta(meta))
}
