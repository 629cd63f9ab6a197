use axum::extract::Multipart;
use axum::body::Bytes;
use serde_json::{Map, Value};

use crate::error::ApiError;

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A multipart form: the `file` part plus every text part
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: Map<String, Value>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm { file: None, fields: Map::new() };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
                form.file = Some(UploadedFile { file_name, content_type, bytes });
            } else if !name.is_empty() {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read field '{}': {}", name, e)))?;
                form.fields.insert(name, Value::String(text));
            }
        }
        Ok(form)
    }

    pub fn require_file(&mut self) -> Result<UploadedFile, ApiError> {
        match self.file.take() {
            Some(file) if !file.bytes.is_empty() => Ok(file),
            Some(_) => Err(ApiError::unprocessable_entity("file", "The file must not be empty.")),
            None => Err(ApiError::unprocessable_entity("file", "The file field is required.")),
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
    }
}
