//! Router and handlers for `POST /summarize` and `GET /health`.
//!
//! A client that disconnects mid-request drops the handler future, which
//! cancels the in-flight stage at its current await point.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::helpers;
use crate::core::models::{InboundRequest, SummarizationRequest, SummarizeResponse};
use crate::worker::pipeline::Pipeline;

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
}

impl ApiState {
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: Vec<String>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/summarize", post(handle_summarize))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves until Ctrl-C, then drains in-flight requests.
///
/// # Errors
///
/// Returns the underlying I/O error if the server fails.
pub async fn serve(listener: TcpListener, state: ApiState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Summarizer API listening on {addr}");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, finishing in-flight requests");
}

#[tracing::instrument(level = "info", skip_all)]
async fn handle_summarize(
    State(state): State<ApiState>,
    payload: Result<Json<InboundRequest>, JsonRejection>,
) -> Response {
    let inbound = match payload {
        Ok(Json(inbound)) => inbound,
        Err(JsonRejection::MissingJsonContentType(_)) => {
            warn!("Rejected request without a JSON content type");
            return helpers::bad_request("Request must be JSON").into_response();
        }
        Err(rejection) => {
            warn!("Rejected malformed JSON body: {}", rejection.body_text());
            return helpers::bad_request(format!(
                "Invalid JSON body: {}",
                rejection.body_text()
            ))
            .into_response();
        }
    };

    let request = match SummarizationRequest::from_inbound(inbound) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected request: {}", e);
            return helpers::err_response(&e).into_response();
        }
    };

    match state.pipeline.run(&request).await {
        Ok(output) => {
            info!(
                request_id = request.id(),
                audio_bytes = output.audio.len(),
                "Returning summary and audio"
            );
            (StatusCode::OK, Json(SummarizeResponse::from(&output))).into_response()
        }
        Err(e) => helpers::err_response(&e).into_response(),
    }
}

async fn handle_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        providers: state
            .pipeline
            .providers()
            .into_iter()
            .map(|p| p.as_str().to_string())
            .collect(),
    })
}
