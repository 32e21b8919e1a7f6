//! Health Check Endpoint
//!
//! Deep health check: besides answering, the handler pings the store and
//! reports the round-trip latency. A failed ping downgrades the status to
//! `degraded` but still answers 200 so the process is not restarted for a
//! database outage.

use std::time::Instant;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health report
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let started = Instant::now();
    let database = match state.health.ping().await {
        Ok(()) => DatabaseStatus {
            connected: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            DatabaseStatus {
                connected: false,
                latency_ms: None,
            }
        }
    };

    Json(HealthResponse {
        status: if database.connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
