use axum::{
    extract::{Multipart, Path, State},
    Extension,
};
use serde_json::{json, Value};

use super::current_citizen;
use crate::handlers::{discard_document_file, multipart::UploadForm};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::resources::registry::DOCUMENTS;
use crate::server::AppState;
use crate::types::Row;

/// POST /portal/documents - multipart upload with `file` plus metadata fields
/// (`title`, `document_type`, `description`, `request_id`, `permit_id`).
/// The stored file is removed again if the record is refused.
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Row> {
    let (_, actor) = current_citizen(&state, &user).await?;
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;

    let stored = state.storage.put("documents", &file.file_name, &file.bytes).await?;

    let mut input = json!({
        "title": form.text("title").unwrap_or(&file.file_name),
        "file_path": stored.path,
        "file_name": file.file_name,
        "mime_type": file.content_type,
        "file_size": stored.size,
        "checksum": stored.checksum,
    });
    for key in ["document_type", "description", "request_id", "permit_id"] {
        if let Some(value) = form.text(key) {
            input[key] = Value::String(value.to_string());
        }
    }

    match state.pipeline.create(&DOCUMENTS, actor, input).await {
        Ok(result) => Ok(ApiResponse::created(result.record).with_message("Document uploaded successfully")),
        Err(e) => {
            if let Err(cleanup) = state.storage.remove(&stored.path).await {
                tracing::warn!("Failed to remove orphaned upload {}: {}", stored.path, cleanup);
            }
            Err(e.into())
        }
    }
}

/// DELETE /portal/documents/:id - removes the record, then the stored file
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Row> {
    let (_, actor) = current_citizen(&state, &user).await?;
    let result = state.pipeline.delete(&DOCUMENTS, actor, id).await?;

    discard_document_file(state.storage.as_ref(), &result.record).await;
    Ok(ApiResponse::success(result.record).with_message("Document deleted successfully"))
}
