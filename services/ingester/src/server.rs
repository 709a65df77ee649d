//! HTTP server for the ingester service.
//!
//! Provides endpoints for:
//! - `POST /submit/record` - Validate and store a parsed shot record
//! - `GET /health` - Health check

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use ingestion::{Ingester, MergeDecision};
use shot_common::RawRecord;

/// Shared state for the HTTP server.
pub struct ServerState {
    /// Core ingester
    pub ingester: Ingester,
}

/// Body returned when a whole ingest fails.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// POST /submit/record - Validate and store a record
async fn submit_record_handler(
    Extension(state): Extension<Arc<ServerState>>,
    Json(record): Json<RawRecord>,
) -> Response {
    info!(channels = record.channels.len(), "Received record submission");

    match state.ingester.ingest_and_store(&record).await {
        Ok(result) => {
            info!(
                record_id = %result.record_id,
                accepted = result.outcome.accepted_channels.len(),
                rejected = result.outcome.rejected_channels.len(),
                "Record submission completed"
            );

            let status = match result.decision {
                MergeDecision::AcceptNew => StatusCode::CREATED,
                MergeDecision::AcceptMerge => StatusCode::OK,
            };
            (status, Json(result.into_response())).into_response()
        }
        Err(e) => {
            if e.is_rejection() {
                warn!(reason = %e, "Record submission rejected");
            } else {
                error!(error = %e, "Record submission failed");
            }

            let status = StatusCode::from_u16(e.http_status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = ErrorResponse {
                detail: e.to_string(),
            };
            (status, Json(body)).into_response()
        }
    }
}

/// GET /health - Health check
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "ingester".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/submit/record", post(submit_record_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

/// Start the HTTP server.
pub async fn start_server(state: Arc<ServerState>, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port = port, "Starting ingester HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
