use axum::{extract::State, Extension};

use super::current_citizen;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::services::dashboard_service::{portal_summary, PortalSummary};

/// GET /portal/dashboard
pub async fn show(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<PortalSummary> {
    let (citizen, _) = current_citizen(&state, &user).await?;
    Ok(ApiResponse::success(portal_summary(state.store.as_ref(), citizen.id).await?))
}
