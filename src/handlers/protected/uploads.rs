use axum::{
    extract::{Multipart, State},
    Extension,
};

use crate::handlers::multipart::UploadForm;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::server::AppState;
use crate::storage::StoredFile;

/// POST /api/uploads - stores a file and returns its path and public URL.
/// The optional `folder` field picks the subdirectory.
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<StoredFile> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.require_file()?;
    let folder = form.text("folder").unwrap_or("uploads").to_string();

    let stored = state.storage.put(&folder, &file.file_name, &file.bytes).await?;
    tracing::info!("User {} uploaded {} ({} bytes)", user.id, stored.path, stored.size);
    Ok(ApiResponse::created(stored).with_message("File uploaded successfully"))
}
