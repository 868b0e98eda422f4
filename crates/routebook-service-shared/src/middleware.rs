//! Request tracking for the route book router.
//!
//! [`TrackingLayer`] wraps every route. Each request gets a [`RequestId`]
//! taken from `X-Request-ID` or minted as a UUID v7. The id is stored in the
//! request extensions, where handlers and problem bodies pick it up, and is
//! echoed on the response. Completed requests record:
//!
//! - `http_requests_total{method, route, status}`
//! - `http_request_duration_seconds{method, route}`
//! - `http_response_size_bytes{method, route}` when the body length is known
//!
//! `route` is the matched template such as `/routes/{id}`, never the raw
//! path, so route ids do not leak into label values.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::extract::MatchedPath;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body;
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Span};
use uuid::Uuid;

/// Header carrying the request correlation ID, in and out.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Route label for requests no route template matched.
const UNMATCHED_ROUTE: &str = "unmatched";

/// Correlation id of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh time-sortable UUID v7.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Use the caller's `X-Request-ID` when it is non-empty UTF-8, otherwise
/// generate one.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(RequestId::new)
        .unwrap_or_else(RequestId::generate)
}

fn status_class(status: StatusCode) -> &'static str {
    if status.is_informational() {
        "1xx"
    } else if status.is_success() {
        "2xx"
    } else if status.is_redirection() {
        "3xx"
    } else if status.is_client_error() {
        "4xx"
    } else {
        "5xx"
    }
}

/// Everything needed to close out one tracked request.
struct RequestRecord {
    request_id: RequestId,
    method: Method,
    route: String,
    started: Instant,
    span: Span,
}

impl RequestRecord {
    fn begin<B>(req: &mut Request<B>) -> Self {
        let request_id = extract_or_generate_request_id(req.headers());
        req.extensions_mut().insert(request_id.clone());

        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
            .to_owned();
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            route = %route,
        );

        Self {
            request_id,
            method: req.method().clone(),
            route,
            started: Instant::now(),
            span,
        }
    }

    fn finish<B: Body>(&self, response: &mut Response<B>) {
        if let Ok(value) = HeaderValue::from_str(self.request_id.as_str()) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        let status = response.status();
        let latency_ms = self.observe(status_class(status));

        if let Some(size) = response.body().size_hint().exact() {
            metrics::histogram!(
                "http_response_size_bytes",
                "method" => self.method.to_string(),
                "route" => self.route.clone()
            )
            .record(size as f64);
        }

        tracing::info!(status = status.as_u16(), latency_ms, "request completed");
    }

    fn fail(&self) {
        let latency_ms = self.observe("5xx");
        tracing::error!(latency_ms, "request failed");
    }

    /// Count the request and record its duration; returns the latency in ms.
    fn observe(&self, status: &'static str) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();

        metrics::counter!(
            "http_requests_total",
            "method" => self.method.to_string(),
            "route" => self.route.clone(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "http_request_duration_seconds",
            "method" => self.method.to_string(),
            "route" => self.route.clone()
        )
        .record(elapsed);

        elapsed * 1000.0
    }
}

/// Layer adding request ids, a request span and HTTP metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingLayer;

impl<S> Layer<S> for TrackingLayer {
    type Service = Tracking<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Tracking { inner }
    }
}

/// Service produced by [`TrackingLayer`].
#[derive(Debug, Clone)]
pub struct Tracking<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Tracking<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = TrackedFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let record = RequestRecord::begin(&mut req);
        let inner = {
            let _entered = record.span.enter();
            tracing::debug!("request received");
            self.inner.call(req)
        };
        TrackedFuture { inner, record }
    }
}

pin_project! {
    /// Response future that finishes the request record.
    pub struct TrackedFuture<F> {
        #[pin]
        inner: F,
        record: RequestRecord,
    }
}

impl<F, B, E> Future for TrackedFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
    B: Body,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _entered = this.record.span.enter();

        let mut result = ready!(this.inner.poll(cx));
        match &mut result {
            Ok(response) => this.record.finish(response),
            Err(_) => this.record.fail(),
        }
        Poll::Ready(result)
    }
}
