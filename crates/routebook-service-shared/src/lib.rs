//! Shared HTTP infrastructure for the route book service.
//!
//! - [`AppState`]: the opened [`routebook_lib::RouteStore`] shared by handlers
//! - [`ServiceConfig`]: database location and port from the environment
//! - [`health`]: liveness/readiness checks
//! - [`ProblemDetails`]: RFC 9457 error bodies
//! - [`extract`]: extractors that reject with problem bodies
//! - [`metrics`]: Prometheus recorder and business counters
//! - [`logging`]: structured JSON logging setup
//! - [`middleware`]: request ids, request spans and HTTP metrics
//!
//! # Architecture
//!
//! Handlers stay thin; every query and write lives in `routebook-lib`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Extract path, query and JSON body                        │
//! │  - Validate the payload                                     │
//! │  - Call RouteStore                                          │
//! │  - Map lib errors to ProblemDetails                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! [`test_utils`] builds in-memory states. Enable the `test-utils` feature to
//! use it from dependent crates.

#![deny(warnings)]

mod config;
pub mod extract;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{DatabaseLocation, ServiceConfig, DEFAULT_DATABASE_PATH, DEFAULT_PORT};
pub use extract::{ApiPath, ApiQuery, ValidatedJson};
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_query_rejected, record_route_written,
    record_routes_listed, MetricsConfig, MetricsError,
};
pub use middleware::{
    extract_or_generate_request_id, RequestId, Tracking, TrackingLayer, REQUEST_ID_HEADER,
};
pub use problem::{
    from_lib_error, FieldViolation, ProblemDetails, PROBLEM_INTERNAL_ERROR,
    PROBLEM_INVALID_QUERY_FIELD, PROBLEM_INVALID_REQUEST, PROBLEM_ROUTE_NOT_FOUND,
    PROBLEM_VALIDATION_FAILED,
};
pub use request::{CountResponse, ListRoutesParams, Validate};
pub use state::{AppState, AppStateError};
