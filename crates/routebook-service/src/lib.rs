//! Routebook HTTP service.
//!
//! # Endpoints
//!
//! - `GET /routes` - List routes with filters, sorting and pagination
//! - `POST /routes` - Create a route
//! - `GET /routes/{id}` - Fetch one route
//! - `PUT /routes/{id}` - Replace a route
//! - `DELETE /routes/{id}` - Delete a route
//! - `GET /routes/from/max` - Route whose origin has the largest coordinate sum
//! - `GET /routes/distance/lower/{value}/count` - Count routes shorter than `value`
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - Kubernetes liveness check
//! - `GET /health/ready` - Kubernetes readiness check

#![deny(warnings)]

mod handlers;

use axum::{routing::get, Router};

use routebook_service_shared::{
    health_live, health_ready, metrics_handler, AppState, MetricsConfig, TrackingLayer,
};

/// Build the service router.
///
/// The metrics route is mounted at `metrics.path` and left out entirely when
/// metrics are disabled.
pub fn app(state: AppState, metrics: &MetricsConfig) -> Router {
    let mut router = Router::new()
        .route(
            "/routes",
            get(handlers::list_routes).post(handlers::create_route),
        )
        .route("/routes/from/max", get(handlers::route_with_max_from_score))
        .route(
            "/routes/distance/lower/{value}/count",
            get(handlers::count_routes_below),
        )
        .route(
            "/routes/{id}",
            get(handlers::get_route)
                .put(handlers::update_route)
                .delete(handlers::delete_route),
        )
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready));

    if metrics.enabled {
        router = router.route(&metrics.path, get(metrics_handler));
    }

    router.layer(TrackingLayer).with_state(state)
}
