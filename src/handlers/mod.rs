//! HTTP handlers, grouped by surface.

pub mod admin;
pub mod auth;
pub mod content;
pub mod shell;

use axum::{
    Json,
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::{
    repository::RepoError,
    storage::{StorageError, StorageState, object_name},
    utils,
};

/// ApiError
///
/// Failure of a JSON endpoint. The body is always `{"error": "<message>"}`;
/// internal causes are logged, not returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("identity service unavailable")]
    IdentityUnavailable,
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::IdentityUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Repo(RepoError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Repo(e) => {
                tracing::error!(error = %e, "repository write failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "image upload failed");
                StatusCode::BAD_GATEWAY
            }
        };
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_string(),
            StatusCode::BAD_GATEWAY => "image upload failed".to_string(),
            _ => self.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// A file part received in a multipart form.
#[derive(Debug)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// UploadForm
///
/// A drained multipart body: text fields by name, plus the `image` file part if
/// one with content was sent.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub image: Option<FilePart>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    // Browsers send an empty part when the file input was left blank.
                    if name == "image" && !bytes.is_empty() {
                        form.image = Some(FilePart {
                            file_name,
                            content_type,
                            bytes: bytes.to_vec(),
                        });
                    }
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed value of a non-empty field.
    pub fn optional(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> Result<String, ApiError> {
        self.optional(name)
            .ok_or_else(|| ApiError::BadRequest(format!("missing field: {}", name)))
    }

    pub fn optional_date(&self, name: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
        self.optional(name)
            .map(|raw| {
                utils::parse_iso(&raw)
                    .ok_or_else(|| ApiError::BadRequest(format!("invalid date: {}", name)))
            })
            .transpose()
    }

    pub fn required_date(&self, name: &str) -> Result<DateTime<Utc>, ApiError> {
        self.optional_date(name)?
            .ok_or_else(|| ApiError::BadRequest(format!("missing field: {}", name)))
    }

    pub fn require_image(&mut self) -> Result<FilePart, ApiError> {
        self.image
            .take()
            .ok_or_else(|| ApiError::BadRequest("missing field: image".to_string()))
    }
}

/// Uploads `file` into `bucket` and returns its public URL.
pub async fn upload_image(
    storage: &StorageState,
    bucket: &str,
    file: FilePart,
) -> Result<String, ApiError> {
    let path = object_name(Utc::now().timestamp_millis(), &file.file_name);
    storage
        .upload(bucket, &path, file.bytes, &file.content_type)
        .await?;
    tracing::info!(bucket, %path, "image uploaded");
    Ok(storage.public_url(bucket, &path))
}

/// Uploads the image only if the form carried one.
pub async fn upload_optional_image(
    storage: &StorageState,
    bucket: &str,
    file: Option<FilePart>,
) -> Result<Option<String>, ApiError> {
    match file {
        Some(file) => upload_image(storage, bucket, file).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_statuses() {
        let status = |e: ApiError| e.into_response().status();
        assert_eq!(status(ApiError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ApiError::Repo(RepoError::Conflict("news_slug_key".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ApiError::IdentityUnavailable), StatusCode::SERVICE_UNAVAILABLE);
    }
}
