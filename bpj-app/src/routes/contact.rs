use crate::contact::ContactMessage;
use crate::server::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Json};
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/contact", post(submit_contact))
}

#[tracing::instrument(level = "info", skip_all)]
async fn submit_contact(
    Extension(state): Extension<Arc<AppState>>,
    Json(message): Json<ContactMessage>,
) -> Response {
    if let Some(field) = message.first_invalid_field() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "status": "error",
                "error": format!("{field} is missing or invalid"),
            })),
        )
            .into_response();
    }

    if let Err(e) = state.contact_inbox.record(&message).await {
        tracing::error!(error = %e, "contact intake write failed");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "status": "error",
                "error": "failed to record your message; please try again",
            })),
        )
            .into_response();
    }

    Json(serde_json::json!({
        "status": "ok",
        "message": "Terima kasih atas pesan Anda. Kami akan segera merespons.",
    }))
    .into_response()
}
