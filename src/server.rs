//! HTTP server for the recommendation API
//!
//! Exposes the poem recommendation endpoint and a health probe over JSON,
//! with request tracing and permissive CORS for the web client.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};
use tracing::{error, info, Level};

use crate::models::{Config, PoemRequest, RecommendResponse};
use crate::service::RecommendService;
use crate::Result;

/// JSON bodies may carry a base64-encoded photo, so allow well past the
/// attachment cap before rejecting outright.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    pub service: RecommendService,
}

/// Simple fallback handler for unmatched routes.
async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn recommend_handler(
    State(state): State<Arc<AppState>>,
    req: std::result::Result<Json<PoemRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>> {
    let Json(request) = req?;
    let poem_text = state.service.recommend(&request).await?;
    Ok(Json(RecommendResponse { poem_text }))
}

/// Builds the application router around `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/recommend", post(recommend_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .fallback(fallback)
}

/// Starts the HTTP server and serves until the process exits.
pub async fn serve(config: &Config) -> Result<()> {
    let state = Arc::new(AppState {
        service: RecommendService::from_config(config),
    });
    let router = router(state);

    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!("Starting HTTP server on http://{}", addr);
            listener
        }
        Err(err) => {
            error!("Failed to bind to {}: {}", addr, err);
            return Err(err.into());
        }
    };
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
