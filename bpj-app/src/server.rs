//! Storefront HTTP server.
//!
//! Wires config, catalog, contact intake, and the estimator client into an
//! axum router with the usual middleware stack.

use crate::catalog::Catalog;
use crate::config::BpjConfig;
use crate::contact::ContactInbox;
use crate::routes;
use anyhow::Result;
use axum::Extension;
use axum::http::{HeaderMap, Request};
use axum::response::Response;
use bpj_estimator::EstimatorClient;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub catalog: Catalog,
    pub contact_inbox: ContactInbox,
    pub estimator: EstimatorClient,
}

pub async fn doctor(config_path: Option<PathBuf>) -> Result<()> {
    let (cfg, path) = BpjConfig::load_with_path(config_path).await?;
    let catalog = Catalog::load_embedded()?;
    let addr = cfg.bind_addr()?;
    let data_dir = cfg.data_dir_path()?;
    tracing::info!(
        model = %cfg.general.model,
        bind_addr = %addr,
        estimator_configured = cfg.estimator_configured(),
        catalog_products = catalog.products().len(),
        data_dir = %data_dir.display(),
        config_path = %path.display(),
        "config ok"
    );
    Ok(())
}

pub async fn estimate_one_shot(config_path: Option<PathBuf>, description: &str) -> Result<()> {
    let cfg = BpjConfig::load(config_path).await?;
    let estimator = EstimatorClient::new(cfg.estimator_config());
    let materials = estimator.estimate(description).await?;
    println!("{}", serde_json::to_string_pretty(&materials)?);
    Ok(())
}

pub async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    let (cfg, cfg_path) = BpjConfig::load_with_path(config_path).await?;
    let addr = cfg.bind_addr()?;
    let data_dir = cfg.data_dir_path()?;
    tracing::info!(
        model = %cfg.general.model,
        bind_addr = %addr,
        estimator_configured = cfg.estimator_configured(),
        http_timeout_seconds = cfg.server.http_timeout_seconds,
        http_max_in_flight = cfg.server.http_max_in_flight,
        data_dir = %data_dir.display(),
        config_path = %cfg_path.display(),
        "server configuration loaded"
    );
    let listener = preflight_bind_listener(addr).await?;

    let catalog = Catalog::load_embedded()?;
    tracing::info!(catalog_products = catalog.products().len(), "catalog loaded");
    let contact_inbox = ContactInbox::new(cfg.contact_inbox_path()?);
    let estimator = EstimatorClient::new(cfg.estimator_config());
    if !estimator.is_configured() {
        tracing::warn!("gemini api key not configured; estimation requests will fail until one is set");
    }

    let state = Arc::new(AppState {
        catalog,
        contact_inbox,
        estimator,
    });

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id_from_headers(request.headers())
            )
        })
        .on_response(
            |response: &Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "http request completed"
                );
            },
        )
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, _span: &tracing::Span| {
                tracing::error!(
                    error_class = %error,
                    latency_ms = latency.as_millis() as u64,
                    "http request failed"
                );
            },
        );

    let app = routes::router()
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(GlobalConcurrencyLimitLayer::new(cfg.server.http_max_in_flight))
        .layer(TimeoutLayer::new(Duration::from_secs(
            cfg.server.http_timeout_seconds,
        )))
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    tracing::info!(%addr, "bpj storefront serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("http server shutdown completed");

    Ok(())
}

async fn preflight_bind_listener(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("preflight bind failed for {addr}: {e}"))?;
    tracing::info!(%addr, "preflight bind check passed");
    Ok(listener)
}

fn request_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "missing".to_string())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler; falling back to ctrl_c only");
                if let Err(ctrlc_err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %ctrlc_err, "failed to await ctrl-c signal");
                }
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("received ctrl-c; beginning graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::warn!("received SIGTERM; beginning graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to await ctrl-c signal");
        } else {
            tracing::warn!("received ctrl-c; beginning graceful shutdown");
        }
    }
}
