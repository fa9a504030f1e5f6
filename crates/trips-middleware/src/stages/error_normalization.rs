//! Error normalization.
//!
//! Runs after the handler and makes sure every `4xx`/`5xx` response leaves
//! the service as an [`ErrorEnvelope`] tagged with the request id:
//!
//! - bodies that already are envelopes get the request id filled in,
//! - anything else is wrapped in an envelope derived from the status,
//! - messages and details of internal errors are replaced by a generic
//!   message unless [`expose_internal_errors`](ErrorNormalizationMiddleware::expose_internal_errors)
//!   is set.
//!
//! Response headers (`Allow`, `Retry-After`, rate limit headers) survive.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{body_bytes, Request, Response, APPLICATION_JSON};
use bytes::Bytes;
use http::{header, HeaderValue, StatusCode};
use http_body_util::Full;
use trips_core::{ErrorCategory, ErrorDetail, ErrorEnvelope, RequestId};

const INTERNAL_MESSAGE: &str = "internal server error";

/// Rewrites error responses into the standard envelope.
#[derive(Debug, Clone, Default)]
pub struct ErrorNormalizationMiddleware {
    expose_internal_errors: bool,
}

impl ErrorNormalizationMiddleware {
    /// Hides server error messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether server error messages and details reach the client.
    ///
    /// Only meant for development.
    #[must_use]
    pub const fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Normalizes `response` if it is an error.
    pub async fn normalize(&self, response: Response, request_id: RequestId) -> Response {
        let status = response.status();
        if !status.is_client_error() && !status.is_server_error() {
            return response;
        }

        let (mut parts, body) = response.into_parts();
        let body = body_bytes(body).await;

        let mut envelope = serde_json::from_slice::<ErrorEnvelope>(&body)
            .unwrap_or_else(|_| self.envelope_for(status, &body));

        if envelope.request_id.is_none() {
            envelope.request_id = Some(request_id.to_string());
        }

        if envelope.error.category == ErrorCategory::Internal && !self.expose_internal_errors {
            envelope.error.message = INTERNAL_MESSAGE.to_string();
            envelope.error.details = None;
        }

        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize error envelope");
                body
            }
        };

        parts.headers.remove(header::CONTENT_LENGTH);
        parts
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        Response::from_parts(parts, Full::new(body))
    }

    fn envelope_for(&self, status: StatusCode, body: &[u8]) -> ErrorEnvelope {
        let text = std::str::from_utf8(body).map(str::trim).unwrap_or_default();
        let category = category_for(status);
        let hidden = category == ErrorCategory::Internal && !self.expose_internal_errors;
        let message = if text.is_empty() || hidden {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_ascii_lowercase()
        } else {
            text.to_string()
        };

        ErrorEnvelope {
            error: ErrorDetail {
                code: status_code_name(status),
                message,
                category,
                details: None,
            },
            request_id: None,
        }
    }
}

fn status_code_name(status: StatusCode) -> String {
    match status.as_u16() {
        400 => "BAD_REQUEST".to_string(),
        404 => "NOT_FOUND".to_string(),
        405 => "METHOD_NOT_ALLOWED".to_string(),
        408 => "REQUEST_TIMEOUT".to_string(),
        413 => "PAYLOAD_TOO_LARGE".to_string(),
        415 => "UNSUPPORTED_MEDIA_TYPE".to_string(),
        422 => "UNPROCESSABLE_ENTITY".to_string(),
        429 => "RATE_LIMITED".to_string(),
        500 => "INTERNAL_ERROR".to_string(),
        503 => "SERVICE_UNAVAILABLE".to_string(),
        504 => "TIMEOUT".to_string(),
        other => format!("HTTP_{other}"),
    }
}

fn category_for(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        404 => ErrorCategory::NotFound,
        405 | 413 | 415 => ErrorCategory::Protocol,
        408 | 504 => ErrorCategory::Timeout,
        429 => ErrorCategory::RateLimited,
        400..=499 => ErrorCategory::Validation,
        _ => ErrorCategory::Internal,
    }
}

impl Middleware for ErrorNormalizationMiddleware {
    fn name(&self) -> &'static str {
        "error_normalization"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let response = next.run(ctx, request).await;
            self.normalize(response, ctx.request_id()).await
        })
    }
}
