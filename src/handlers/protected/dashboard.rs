use std::collections::BTreeMap;

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::dashboard_service::{admin_summary, ResourceSummary};

/// GET /api/dashboard
pub async fn show(State(state): State<AppState>) -> ApiResult<BTreeMap<&'static str, ResourceSummary>> {
    let summary = admin_summary(state.store.as_ref()).await?;
    Ok(ApiResponse::success(summary))
}
