use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::resources::exposed;
use crate::server::AppState;

pub async fn root() -> impl IntoResponse {
    let resources: Vec<String> = exposed().map(|s| format!("/api/{}", s.name)).collect();

    Json(json!({
        "success": true,
        "message": "OK",
        "data": {
            "name": "Civic Portal API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Municipal administration portal backend",
            "endpoints": {
                "health": "/health (public)",
                "resources": resources,
                "uploads": "/api/uploads (staff)",
                "dashboard": "/api/dashboard (staff)",
                "notifications": "/api/notifications (authenticated)",
                "portal": "/portal/* (citizen self-service)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "OK",
                "data": { "status": "ok", "timestamp": now, "database": backend }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now, "database": backend }
                })),
            )
        }
    }
}
