pub mod middleware;

use axum::{
    extract::{Request, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    response::IntoResponse,
    Json,
    Router,
    ServiceExt,
};
use serde_json::json;

use std::sync::Arc;
use tracing::info;

use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{method_not_allowed, preflight, send_email};
use middleware::{CorsHeaders, cors_headers};

pub use crate::AppState;

pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let state = self.state.clone();
        let cors = CorsHeaders::new(&state.config);

        let submissions = post(send_email)
            .options(preflight)
            .fallback(method_not_allowed);

        Router::new()
            .route(&state.config.server.route, submissions)
            .route("/health", get(health))
            .route("/version", get(version))
            .layer(from_fn_with_state(cors, cors_headers))
            .layer(TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let path = request.uri().path().to_owned();
                    let method = request.method().clone();
                    tracing::info_span!("http-request", %path, %method)
                })
                .on_request(|_request: &Request<_>, _span: &tracing::Span| {
                    tracing::event!(tracing::Level::INFO, "request received");
                })
                .on_response(|response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                    let status = response.status().as_u16();
                    tracing::event!(tracing::Level::INFO, status = status, latency = ?latency, "sent response");
                })
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!("request failed: {}", error);
                })
            )
            .with_state(state)
    }

    pub async fn run(&self) -> Result<(), anyhow::Error> {
        let addr = self.state.config.http_addr();

        let app = NormalizePathLayer::trim_trailing_slash()
            .layer(self.router());

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to address {}: {}", addr, e))?;

        info!("Listening on {} (submissions at {})", addr, self.state.config.server.route);

        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

pub async fn health(
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(json!({
        "healthy": true,
        "mode": state.mode.as_str(),
        "mail": state.mailer.is_some(),
        "records": state.duplicates.is_some(),
    }))
}

pub async fn version() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    let hash = env!("GIT_COMMIT_HASH");

    Json(json!({
        "version": version,
        "commit": hash,
    }))
}
