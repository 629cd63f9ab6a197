// Notification inbox, shared by the admin console and the portal: both list
// and mark the caller's own notifications.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use crate::api::ListQuery;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::resources::registry::NOTIFICATIONS;
use crate::server::AppState;
use crate::services::notification_service;
use crate::types::Row;

pub async fn index(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Row>> {
    let query = ListQuery::parse(&NOTIFICATIONS, &params, &state.config.api)?;
    let (rows, meta) = notification_service::list_for_user(state.store.as_ref(), user.id, query).await?;
    Ok(ApiResponse::success(rows).with_meta(meta))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Row> {
    let row = notification_service::mark_read(state.store.as_ref(), user.id, id).await?;
    Ok(ApiResponse::success(row).with_message("Notification marked as read"))
}
