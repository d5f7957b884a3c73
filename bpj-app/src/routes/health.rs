use crate::server::AppState;
use axum::routing::get;
use axum::{Extension, Json};
use chrono::Utc;
use std::sync::Arc;

pub fn router() -> axum::Router {
    axum::Router::new().route("/api/v1/health", get(get_health))
}

#[tracing::instrument(level = "debug", skip_all)]
async fn get_health(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "ready": true,
        "checked_at": Utc::now(),
        "checks": {
            "estimator": {
                "configured": state.estimator.is_configured(),
                "model": state.estimator.model(),
            },
            "catalog": {
                "products": state.catalog.products().len(),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{response_body_json, test_router};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_reports_status_and_estimator_configuration() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_body_json(response).await;
        assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("ok"));
        assert_eq!(body["checks"]["estimator"]["configured"], false);
        assert!(body["checks"]["catalog"]["products"].as_u64().expect("product count") > 0);
    }
}
