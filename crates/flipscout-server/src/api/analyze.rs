use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};

use flipscout_analysis::types::{ProductInsight, ProductMetrics};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeRequest {
    description: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeData {
    description: String,
    metrics: ProductMetrics,
}

/// Analyzes a product from a caller-supplied description.
///
/// The description drives all three metric searches directly; no vision
/// step is involved. Individual metric failures degrade to `null` sections
/// in the response rather than failing the request.
pub(super) async fn analyze_description(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "description must not be empty",
        ));
    }

    tracing::info!(description, "starting description analysis");

    let insight = ProductInsight::from_description(description);
    let metrics = state.engine.analyze(&insight).await;

    Ok(Json(ApiResponse {
        data: AnalyzeData {
            description: description.to_owned(),
            metrics,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
