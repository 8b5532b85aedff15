use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct VolumeParams {
    search_term: Option<String>,
}

/// Looks up marketplace order volume for a search term.
///
/// `data` is `null` when the marketplace returned no listings — that is a
/// valid "no data" outcome, not an error.
pub(super) async fn order_volume(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<VolumeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let search_term = params
        .search_term
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "search_term query parameter is required",
            )
        })?;

    let volume = state
        .engine
        .order_volume(search_term)
        .await
        .map_err(|e| {
            tracing::warn!(search_term, error = %e, "order volume lookup failed");
            ApiError::new(
                req_id.0.clone(),
                "upstream_error",
                "order volume lookup failed",
            )
        })?;

    Ok(Json(ApiResponse {
        data: volume,
        meta: ResponseMeta::new(req_id.0),
    }))
}
