//! End-to-end tests for the estimator client against a local fixture server
//! standing in for the Gemini endpoint.

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use bpj_estimator::{EstimateError, EstimatedMaterial, EstimatorClient, EstimatorConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const MODEL: &str = "gemini-2.5-flash";

#[derive(Clone)]
struct Fixture {
    hits: Arc<AtomicUsize>,
    status: u16,
    body: String,
}

async fn generate_content(State(fixture): State<Fixture>) -> impl IntoResponse {
    fixture.hits.fetch_add(1, Ordering::SeqCst);
    (
        axum::http::StatusCode::from_u16(fixture.status).expect("valid fixture status"),
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        fixture.body.clone(),
    )
}

async fn spawn_fixture(status: u16, body: impl Into<String>) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let fixture = Fixture {
        hits: hits.clone(),
        status,
        body: body.into(),
    };
    let app = Router::new()
        .route(
            &format!("/v1beta/models/{MODEL}:generateContent"),
            post(generate_content),
        )
        .with_state(fixture);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fixture server");
    });
    (format!("http://{addr}"), hits)
}

fn client(base_url: &str, api_key: Option<&str>) -> EstimatorClient {
    EstimatorClient::new(EstimatorConfig {
        api_key: api_key.map(str::to_string),
        model: MODEL.to_string(),
        base_url: base_url.to_string(),
    })
}

/// Wraps payload text the way `generateContent` returns it.
fn envelope(text: &str) -> String {
    serde_json::json!({
        "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
    })
    .to_string()
}

#[tokio::test]
async fn estimate_returns_the_parsed_service_payload() {
    let payload = r#"[{"materialName":"Batu Bata","quantity":"2000","unit":"pcs","notes":"Untuk struktur pagar"}]"#;
    let (base_url, hits) = spawn_fixture(200, envelope(payload)).await;

    let materials = client(&base_url, Some("fixture-key"))
        .estimate("Membangun pagar rumah sepanjang 20 meter")
        .await
        .expect("estimate succeeds");

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(
        materials,
        vec![EstimatedMaterial {
            material_name: "Batu Bata".to_string(),
            quantity: "2000".to_string(),
            unit: "pcs".to_string(),
            notes: "Untuk struktur pagar".to_string(),
        }]
    );
}

#[tokio::test]
async fn estimate_preserves_service_order_without_normalizing_quantities() {
    let payload = r#"[
        {"materialName":"Pasir Pasang","quantity":"10-12","unit":"m³","notes":"Adukan pasangan bata"},
        {"materialName":"Semen","quantity":"40","unit":"sak","notes":"Perekat"}
    ]"#;
    let (base_url, _hits) = spawn_fixture(200, envelope(payload)).await;

    let materials = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar bata 20 meter")
        .await
        .expect("estimate succeeds");

    assert_eq!(materials.len(), 2);
    assert_eq!(materials[0].material_name, "Pasir Pasang");
    assert_eq!(materials[0].quantity, "10-12", "ranges must pass through untouched");
    assert_eq!(materials[1].material_name, "Semen");
}

#[tokio::test]
async fn missing_api_key_fails_before_any_network_io() {
    let (base_url, hits) = spawn_fixture(200, envelope("[]")).await;

    let err = client(&base_url, None)
        .estimate("bangun pagar")
        .await
        .expect_err("absent key must fail");
    assert!(matches!(err, EstimateError::MissingApiKey));

    let err = client(&base_url, Some("   "))
        .estimate("bangun pagar")
        .await
        .expect_err("blank key must fail");
    assert!(matches!(err, EstimateError::MissingApiKey));

    assert_eq!(hits.load(Ordering::SeqCst), 0, "no request may reach the service");
}

#[tokio::test]
async fn empty_payload_text_maps_to_empty_response() {
    let (base_url, _hits) = spawn_fixture(200, envelope("  \n  ")).await;
    let err = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("whitespace payload must fail");
    assert!(matches!(err, EstimateError::EmptyResponse));
    assert!(err.to_string().contains("rephrasing"));

    // An envelope with no candidates at all reads as empty text too.
    let (base_url, _hits) = spawn_fixture(200, "{}").await;
    let err = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("candidate-less envelope must fail");
    assert!(matches!(err, EstimateError::EmptyResponse));
}

#[tokio::test]
async fn non_json_payload_maps_to_parse_error() {
    let (base_url, _hits) = spawn_fixture(200, envelope("here are some materials: sand")).await;
    let err = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("prose payload must fail");
    assert!(matches!(err, EstimateError::Parse(_)));
}

#[tokio::test]
async fn record_missing_a_field_discards_the_whole_response() {
    // Second record has no notes; the valid first record must not survive.
    let payload = r#"[
        {"materialName":"Batu Bata","quantity":"2000","unit":"pcs","notes":"Untuk struktur pagar"},
        {"materialName":"Semen","quantity":"40","unit":"sak"}
    ]"#;
    let (base_url, _hits) = spawn_fixture(200, envelope(payload)).await;
    let err = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("incomplete record must fail");
    assert!(matches!(err, EstimateError::Parse(_)));
}

#[tokio::test]
async fn non_string_field_maps_to_parse_error() {
    let payload = r#"[{"materialName":"Batu Bata","quantity":2000,"unit":"pcs","notes":"n"}]"#;
    let (base_url, _hits) = spawn_fixture(200, envelope(payload)).await;
    let err = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("numeric quantity must fail");
    assert!(matches!(err, EstimateError::Parse(_)));
}

#[tokio::test]
async fn rejected_credential_maps_to_invalid_api_key() {
    let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
    let (base_url, _hits) = spawn_fixture(400, body).await;
    let err = client(&base_url, Some("bad-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("rejected key must fail");
    assert!(matches!(err, EstimateError::InvalidApiKey));
}

#[tokio::test]
async fn other_upstream_failures_map_to_generic_service_error() {
    let (base_url, _hits) = spawn_fixture(500, r#"{"error":{"code":500}}"#).await;
    let err = client(&base_url, Some("fixture-key"))
        .estimate("bangun pagar")
        .await
        .expect_err("upstream 5xx must fail");
    assert!(matches!(err, EstimateError::Service));
    assert!(
        err.to_string().contains("try again later"),
        "upstream detail must not leak into the caller-facing message"
    );
}
