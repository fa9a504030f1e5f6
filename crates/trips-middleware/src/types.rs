//! Request and response types used throughout the pipeline.

use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use trips_core::{RequestId, ServiceError};

/// The HTTP request type used in the pipeline.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type used in the pipeline.
pub type Response = http::Response<Full<Bytes>>;

/// `Content-Type` of every body the service produces.
pub const APPLICATION_JSON: &str = "application/json";

/// Fallback body when a payload cannot be serialized.
const SERIALIZATION_FAILURE: &str =
    r#"{"error":{"code":"INTERNAL_ERROR","message":"internal server error","category":"internal"}}"#;

/// Constructors for the responses the service sends.
pub trait ResponseExt {
    /// Serializes `value` as the JSON body of a response with `status`.
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Response;

    /// Builds the standard error envelope response for `error`.
    fn service_error(error: &ServiceError, request_id: Option<RequestId>) -> Response;

    /// A response with no body.
    fn empty(status: StatusCode) -> Response;
}

impl ResponseExt for Response {
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Response {
        let (status, body) = match serde_json::to_vec(value) {
            Ok(body) => (status, Bytes::from(body)),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response body");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Bytes::from_static(SERIALIZATION_FAILURE.as_bytes()),
                )
            }
        };

        let mut response = http::Response::new(Full::new(body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON),
        );
        response
    }

    fn service_error(error: &ServiceError, request_id: Option<RequestId>) -> Response {
        let request_id = request_id.map(|id| id.to_string());
        let envelope = error.to_envelope(request_id.as_deref());
        let mut response = Self::json(error.status_code(), &envelope);

        match error {
            ServiceError::MethodNotAllowed { allowed } => {
                if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
            }
            ServiceError::RateLimited {
                retry_after_seconds,
            } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_seconds));
            }
            _ => {}
        }

        response
    }

    fn empty(status: StatusCode) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::new()));
        *response.status_mut() = status;
        response
    }
}

/// Reads a buffered body into bytes.
pub async fn body_bytes(body: Full<Bytes>) -> Bytes {
    match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}
