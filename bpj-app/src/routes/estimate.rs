use crate::server::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json};
use bpj_estimator::EstimateError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimateRequest {
    #[serde(default)]
    project_description: String,
}

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/estimate", post(post_estimate))
}

#[tracing::instrument(level = "info", skip_all)]
async fn post_estimate(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<EstimateRequest>,
) -> Response {
    match state.estimator.estimate(&req.project_description).await {
        Ok(materials) => Json(serde_json::json!({
            "status": "ok",
            "materials": materials,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "estimation failed");
            (
                estimate_error_status(&e),
                Json(serde_json::json!({
                    "status": "error",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

fn estimate_error_status(error: &EstimateError) -> StatusCode {
    match error {
        EstimateError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
        EstimateError::InvalidApiKey
        | EstimateError::EmptyResponse
        | EstimateError::Parse(_)
        | EstimateError::Service => StatusCode::BAD_GATEWAY,
    }
}
