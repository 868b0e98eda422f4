//! Health check handlers for Kubernetes liveness and readiness checks.
//!
//! `/health/live` answers as long as the process runs; `/health/ready` also
//! checks that the route store can be queried.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Routes currently stored (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes_stored: Option<u64>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            routes_stored: None,
        }
    }

    pub fn ready(service: &str, version: &str, routes: u64) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            routes_stored: Some(routes),
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            service: service.to_string(),
            version: version.to_string(),
            routes_stored: None,
        }
    }
}

/// Liveness check handler.
///
/// Returns 200 OK whenever the process is serving requests; it does not touch
/// the store.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"routebook-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness check handler.
///
/// Runs a count against the store; an empty store is still ready, a failing
/// one answers 503.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"routebook-service-shared","version":"0.1.0","routes_stored":12}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    match state.with_store(|store| store.count_routes()).await {
        Ok(Ok(routes)) => {
            let status = HealthStatus::ready(service, version, routes);
            (StatusCode::OK, Json(status)).into_response()
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, database = %state.database(), "readiness check failed");
            not_ready(service, version)
        }
        Err(err) => {
            tracing::warn!(error = %err, "readiness check did not complete");
            not_ready(service, version)
        }
    }
}

fn not_ready(service: &str, version: &str) -> Response {
    let status = HealthStatus::not_ready(service, version, "store unavailable");
    (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
}
