//! Error types for the trips service.
//!
//! Two layers of errors live here:
//!
//! - [`TripError`] is what the resolver returns. It knows nothing about HTTP.
//! - [`ServiceError`] covers everything a request can fail with, including
//!   trip errors, and knows how to describe itself as a status code and a
//!   JSON [`ErrorEnvelope`].
//!
//! # Envelope format
//!
//! ```json
//! {
//!   "error": {
//!     "code": "MALFORMED_TRIP",
//!     "message": "flights do not form a single trip",
//!     "category": "validation",
//!     "details": { "reason": "expected exactly two endpoint airports, found 0" }
//!   },
//!   "request_id": "01890a5d-ac96-774b-bcce-b302099a8057"
//! }
//! ```

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`ServiceError`].
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Why a list of flights could not be reduced to one origin and destination.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformation {
    /// The number of airports occurring exactly once was not two.
    ///
    /// Zero points at a cycle; more than two at disjoint trips; one at
    /// duplicated legs.
    #[error("expected exactly two endpoint airports, found {0}")]
    EndpointCount(usize),

    /// Both endpoint airports only ever appear as destinations.
    #[error("no endpoint airport departs, so the trip has no origin")]
    NoOrigin,

    /// Both endpoint airports only ever appear as sources.
    #[error("no endpoint airport is arrived at, so the trip has no destination")]
    NoDestination,
}

/// Errors returned by [`resolve`](crate::resolve).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripError {
    /// No flights were given.
    #[error("trip has no flights")]
    Empty,

    /// The flights do not describe a single trip.
    #[error("flights do not form a single trip: {0}")]
    Malformed(#[from] Malformation),
}

/// Broad classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request content was invalid.
    Validation,
    /// Nothing is routed at the requested path.
    NotFound,
    /// The request was rejected at the HTTP layer (method, media type, size).
    Protocol,
    /// The client sent too many requests.
    RateLimited,
    /// The request took too long.
    Timeout,
    /// Something failed inside the service.
    Internal,
}

/// Every way a request to the service can fail.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request body was missing or could not be decoded.
    #[error("{message}")]
    Decode {
        /// Human readable message.
        message: String,
        /// Decoder diagnostics, if any.
        details: Option<String>,
    },

    /// The decoded flights were rejected by the resolver.
    #[error(transparent)]
    Trip(#[from] TripError),

    /// No route matches the request path.
    #[error("not found")]
    NotFound,

    /// A route matches the path but not the method.
    #[error("method not allowed")]
    MethodNotAllowed {
        /// Methods the path does accept.
        allowed: Vec<String>,
    },

    /// The request body is larger than the configured limit.
    #[error("request body too large")]
    PayloadTooLarge {
        /// The configured limit in bytes.
        limit_bytes: usize,
    },

    /// The request body is not `application/json` in UTF-8.
    #[error("{message}")]
    UnsupportedMediaType {
        /// Human readable message.
        message: String,
    },

    /// The client exceeded its request budget.
    #[error("too many requests")]
    RateLimited {
        /// Seconds until the client may retry.
        retry_after_seconds: u64,
    },

    /// The request body was not received in time.
    #[error("timed out reading request body")]
    RequestTimeout,

    /// The handler did not finish in time.
    #[error("request timed out")]
    Timeout,

    /// An unexpected failure inside the service.
    #[error("{message}")]
    Internal {
        /// Human readable message.
        message: String,
        /// The underlying cause.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ServiceError {
    /// Creates a decode error without diagnostics.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            details: None,
        }
    }

    /// Creates a decode error carrying decoder diagnostics.
    #[must_use]
    pub fn decode_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a method-not-allowed error listing the accepted methods.
    #[must_use]
    pub fn method_not_allowed<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MethodNotAllowed {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an unsupported-media-type error.
    #[must_use]
    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::UnsupportedMediaType {
            message: message.into(),
        }
    }

    /// Creates a rate-limited error.
    #[must_use]
    pub const fn rate_limited(retry_after_seconds: u64) -> Self {
        Self::RateLimited {
            retry_after_seconds,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with an underlying cause.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Decode { .. } | Self::Trip(_) => ErrorCategory::Validation,
            Self::NotFound => ErrorCategory::NotFound,
            Self::MethodNotAllowed { .. }
            | Self::PayloadTooLarge { .. }
            | Self::UnsupportedMediaType { .. } => ErrorCategory::Protocol,
            Self::RateLimited { .. } => ErrorCategory::RateLimited,
            Self::RequestTimeout | Self::Timeout => ErrorCategory::Timeout,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode { .. } | Self::Trip(TripError::Empty) => StatusCode::BAD_REQUEST,
            Self::Trip(TripError::Malformed(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the machine readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "DECODE_ERROR",
            Self::Trip(TripError::Empty) => "EMPTY_TRIP",
            Self::Trip(TripError::Malformed(_)) => "MALFORMED_TRIP",
            Self::NotFound => "NOT_FOUND",
            Self::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::UnsupportedMediaType { .. } => "UNSUPPORTED_MEDIA_TYPE",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::Timeout => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Returns the client-facing message.
    ///
    /// Unlike `Display`, this never includes nested diagnostics; those go
    /// to [`details`](Self::details).
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Trip(TripError::Malformed(_)) => "flights do not form a single trip".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns structured diagnostics for the envelope, if any.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Decode {
                details: Some(details),
                ..
            } => Some(serde_json::Value::String(details.clone())),
            Self::Trip(TripError::Malformed(reason)) => Some(serde_json::json!({
                "reason": reason.to_string()
            })),
            Self::MethodNotAllowed { allowed } => Some(serde_json::json!({
                "allowed": allowed
            })),
            Self::PayloadTooLarge { limit_bytes } => Some(serde_json::json!({
                "limit_bytes": limit_bytes
            })),
            Self::RateLimited {
                retry_after_seconds,
            } => Some(serde_json::json!({
                "retry_after_seconds": retry_after_seconds
            })),
            _ => None,
        }
    }

    /// Converts this error to the standard envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.message(),
                category: self.category(),
                details: self.details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error itself.
    pub error: ErrorDetail,
    /// The request the error belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// The `error` object of an [`ErrorEnvelope`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine readable code, e.g. `EMPTY_TRIP`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Optional diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_error_display() {
        assert_eq!(TripError::Empty.to_string(), "trip has no flights");
        assert_eq!(
            TripError::Malformed(Malformation::EndpointCount(0)).to_string(),
            "flights do not form a single trip: expected exactly two endpoint airports, found 0"
        );
    }

    #[test]
    fn test_empty_trip_is_bad_request() {
        let error = ServiceError::from(TripError::Empty);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "EMPTY_TRIP");
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert!(error.details().is_none());
    }

    #[test]
    fn test_malformed_trip_envelope() {
        let error = ServiceError::from(TripError::from(Malformation::EndpointCount(4)));
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let envelope = error.to_envelope(Some("req-123"));
        assert_eq!(envelope.error.code, "MALFORMED_TRIP");
        assert_eq!(envelope.error.message, "flights do not form a single trip");
        assert_eq!(
            envelope.error.details.unwrap()["reason"],
            "expected exactly two endpoint airports, found 4"
        );
        assert_eq!(envelope.request_id.as_deref(), Some("req-123"));
    }

    #[test]
    fn test_decode_error_details() {
        let error = ServiceError::decode_with_details("cannot decode json", "EOF while parsing");
        let envelope = error.to_envelope(None);
        assert_eq!(envelope.error.message, "cannot decode json");
        assert_eq!(envelope.error.details.unwrap(), "EOF while parsing");

        let json = serde_json::to_value(&error.to_envelope(None)).unwrap();
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn test_decode_error_without_details() {
        let error = ServiceError::decode("cannot read request body");
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.details().is_none());
    }

    #[test]
    fn test_transport_errors() {
        assert_eq!(ServiceError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::NotFound.message(), "not found");

        let error = ServiceError::method_not_allowed(["POST"]);
        assert_eq!(error.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error.message(), "method not allowed");
        assert_eq!(error.details().unwrap()["allowed"][0], "POST");

        let error = ServiceError::rate_limited(1);
        assert_eq!(error.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(error.message(), "too many requests");

        assert_eq!(ServiceError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            ServiceError::RequestTimeout.status_code(),
            StatusCode::REQUEST_TIMEOUT
        );
    }

    #[test]
    fn test_internal_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = ServiceError::internal_with_source("write failed", io);

        assert_eq!(error.category(), ErrorCategory::Internal);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&ErrorCategory::RateLimited).unwrap();
        assert_eq!(json, "\"rate_limited\"");
    }
}
