use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;

use flipscout_analysis::types::{ProductInsight, ProductMetrics};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const PHOTO_FIELD: &str = "photo";
pub(super) const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub(super) struct UploadData {
    description: String,
    social_search_term: String,
    niche: Option<String>,
    adjacent_niche: Option<String>,
    metrics: ProductMetrics,
}

/// Removes the uploaded temp file when the request scope ends, on every
/// exit path — success, validation failure, or panic unwind.
struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove uploaded file");
        } else {
            tracing::debug!(path = %self.path.display(), "removed uploaded file");
        }
    }
}

/// Analyzes a product photo.
///
/// The multipart `photo` field is spooled to the upload directory, handed
/// to the vision step, and the resulting search terms drive the metric
/// pipeline. The vision step is mandatory: its failure fails the request.
pub(super) async fn analyze_photo(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = spool_photo(&state.upload_dir, multipart)
        .await
        .map_err(|reason| ApiError::new(req_id.0.clone(), "validation_error", reason))?;

    let image_bytes = tokio::fs::read(upload.path()).await.map_err(|e| {
        tracing::error!(error = %e, "failed to read spooled upload");
        ApiError::new(req_id.0.clone(), "internal_error", "failed to read upload")
    })?;

    // Mandatory first step: the vision output is the query input for every
    // other metric.
    let insight: ProductInsight = state.vision.analyze_image(&image_bytes).await.map_err(|e| {
        tracing::error!(error = %e, "image analysis failed");
        ApiError::new(req_id.0.clone(), "upstream_error", "image analysis failed")
    })?;

    tracing::info!(
        search_term = insight.search_term,
        social_search_term = insight.social_search_term,
        "image analysis complete, collecting metrics"
    );

    let metrics = state.engine.analyze(&insight).await;

    Ok(Json(ApiResponse {
        data: UploadData {
            description: insight.search_term,
            social_search_term: insight.social_search_term,
            niche: insight.niche,
            adjacent_niche: insight.adjacent_niche,
            metrics,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Reads the `photo` multipart field and writes it under the upload
/// directory with a fresh name. Returns the cleanup guard.
async fn spool_photo(upload_dir: &Path, mut multipart: Multipart) -> Result<TempUpload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed multipart body: {e}"))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit('.').next().map(str::to_owned))
            .unwrap_or_else(|| "jpg".to_owned());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("failed to read photo field: {e}"))?;

        if bytes.is_empty() {
            return Err("uploaded photo is empty".to_owned());
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err("uploaded photo exceeds the 10MB limit".to_owned());
        }

        let path = upload_dir.join(format!("{}.{extension}", Uuid::new_v4()));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| format!("failed to store upload: {e}"))?;

        return Ok(TempUpload { path });
    }

    Err(format!("missing multipart field \"{PHOTO_FIELD}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temp_upload_removes_file_on_drop() {
        let path = std::env::temp_dir().join(format!("{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, b"fake image bytes")
            .await
            .expect("write temp file");
        assert!(path.exists());

        drop(TempUpload { path: path.clone() });

        assert!(!path.exists(), "guard must remove the file on drop");
    }
}
