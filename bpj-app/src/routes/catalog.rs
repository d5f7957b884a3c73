use crate::server::AppState;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json};
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new()
        .route("/api/v1/catalog", get(list_products))
        .route("/api/v1/catalog/{id}", get(get_product))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn list_products(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "products": state.catalog.products() }))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_product(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.catalog.find(&id) {
        Some(product) => Json(serde_json::json!({ "product": product })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "status": "error", "error": "unknown product" })),
        )
            .into_response(),
    }
}
