//! Request extractors that reject with RFC 9457 problems.
//!
//! axum's stock `Json`, `Query` and `Path` extractors answer malformed input
//! with plain-text bodies. The wrappers here convert those rejections into
//! [`ProblemDetails`] carrying the request id, and [`ValidatedJson`] also runs
//! [`Validate`] so handlers only ever see well-formed payloads.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::metrics::record_query_rejected;
use crate::middleware::{extract_or_generate_request_id, RequestId};
use crate::problem::{FieldViolation, ProblemDetails};
use crate::request::Validate;

fn request_id_from_parts(parts: &Parts) -> RequestId {
    parts
        .extensions
        .get::<RequestId>()
        .cloned()
        .unwrap_or_else(|| extract_or_generate_request_id(&parts.headers))
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(request_id_from_parts(parts))
    }
}

/// JSON body that has been parsed and validated.
///
/// Unparsable bodies and bodies failing [`Validate`] are both rejected with a
/// `validation-failed` problem (HTTP 400).
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ProblemDetails;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| extract_or_generate_request_id(req.headers()));

        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(request_id = %request_id, error = %rejection.body_text(), "rejected request body");
                record_query_rejected("validation_failed");
                ProblemDetails::validation_failed(
                    vec![FieldViolation::new("body", rejection.body_text())],
                    request_id.as_str(),
                )
            })?;

        if let Err(problem) = value.validate(request_id.as_str()) {
            tracing::debug!(request_id = %request_id, violations = problem.errors.len(), "request body failed validation");
            record_query_rejected("validation_failed");
            return Err(*problem);
        }

        Ok(Self(value))
    }
}

/// Query string extractor rejecting with an `invalid-request` problem.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ProblemDetails;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id_from_parts(parts);
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                record_query_rejected("invalid_request");
                Err(ProblemDetails::bad_request(
                    rejection.body_text(),
                    request_id.as_str(),
                ))
            }
        }
    }
}

/// Path parameter extractor rejecting with an `invalid-request` problem.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ProblemDetails;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = request_id_from_parts(parts);
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                record_query_rejected("invalid_request");
                Err(ProblemDetails::bad_request(
                    rejection.body_text(),
                    request_id.as_str(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest};
    use routebook_lib::RouteInput;
    use metrics_exporter_prometheus::PrometheusBuilder;

    fn json_request(body: &'static str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .uri("/routes")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-request-id", "req-extract")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_validated_json_accepts_valid_body() {
        let req = json_request(r#"{"name":"Ridge","distance":2.0}"#);
        let ValidatedJson(route) = ValidatedJson::<RouteInput>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(route, RouteInput::new("Ridge", 2.0));
    }

    #[tokio::test]
    async fn test_validated_json_rejects_invalid_body() {
        let req = json_request(r#"{"name":"","distance":-2.0}"#);
        let problem = ValidatedJson::<RouteInput>::from_request(req, &())
            .await
            .unwrap_err();

        assert_eq!(problem.status, 400);
        assert_eq!(problem.errors.len(), 2);
        assert_eq!(problem.instance.as_deref(), Some("req-extract"));
    }

    #[tokio::test]
    async fn test_validated_json_rejects_malformed_body() {
        let req = json_request(r#"{"name":"Ridge""#);
        let problem = ValidatedJson::<RouteInput>::from_request(req, &())
            .await
            .unwrap_err();

        assert_eq!(problem.status, 400);
        assert_eq!(problem.errors[0].field, "body");
    }

    #[test]
    fn test_rejected_body_is_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let req = json_request(r#"{"name":"","distance":1.0}"#);
                assert!(ValidatedJson::<RouteInput>::from_request(req, &())
                    .await
                    .is_err());
            })
        });

        assert!(handle
            .render()
            .contains(r#"routebook_requests_rejected_total{reason="validation_failed"} 1"#));
    }

    #[tokio::test]
    async fn test_request_id_prefers_extension() {
        let req = HttpRequest::builder()
            .uri("/")
            .header("x-request-id", "from-header")
            .extension(RequestId::new("from-extension"))
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let id = RequestId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(id.as_str(), "from-extension");
    }
}
