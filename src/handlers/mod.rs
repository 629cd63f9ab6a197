// handlers/mod.rs - three route tiers
//
// public    → no authentication (/, /health)
// protected → staff JWT (/api/*), the admin console
// portal    → any valid JWT (/portal/*), citizen self-service scoped to the
//             caller's own profile

pub mod multipart;
pub mod portal;
pub mod protected;
pub mod public;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;
use crate::observer::ObserverWarning;
use crate::resources::ResourceSchema;
use crate::storage::FileStorage;
use crate::types::Row;

/// Resource a nested record router serves, attached as a request extension
#[derive(Clone, Copy)]
pub struct Resource(pub &'static ResourceSchema);

/// JSON body with rejections reported in the error envelope
pub fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    payload.map(|Json(value)| value).map_err(|e| ApiError::invalid_json(e.body_text()))
}

/// Non-fatal observer findings, surfaced in `meta.warnings`
pub fn warnings_meta(warnings: &[ObserverWarning]) -> Option<Value> {
    if warnings.is_empty() {
        return None;
    }
    let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
    Some(serde_json::json!({ "warnings": messages }))
}

/// Removes the stored file behind a deleted document row. The row is already
/// gone, so a failure is only logged.
pub async fn discard_document_file(storage: &dyn FileStorage, row: &Row) {
    let Some(path) = row.get("file_path").and_then(Value::as_str) else { return };
    if let Err(e) = storage.remove(path).await {
        tracing::warn!("Document {:?} deleted but file {} was not removed: {}", row.get("id"), path, e);
    }
}
