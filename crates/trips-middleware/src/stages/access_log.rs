//! Access logging.
//!
//! Emits one event when a request arrives and one when its response leaves,
//! both inside a `request` span carrying the request id. Server errors are
//! additionally logged at `error`.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use tracing::Instrument;
use trips_telemetry::{log_request_complete, log_request_error, log_request_start, request_span};

/// Structured access log stage.
#[derive(Debug, Clone, Default)]
pub struct AccessLogMiddleware;

impl AccessLogMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for AccessLogMiddleware {
    fn name(&self) -> &'static str {
        "access_log"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = ctx.request_id();
            let method = request.method().clone();
            let path = request.uri().path().to_string();
            let client_ip = ctx
                .client_ip()
                .map_or_else(|| "-".to_string(), |ip| ip.to_string());

            let span = request_span(&request_id.to_string(), method.as_str(), &path);
            span.in_scope(|| {
                log_request_start!(request_id, method, path, client_ip);
            });

            let response = next.run(ctx, request).instrument(span.clone()).await;

            let status = response.status();
            let duration_ms = ctx.elapsed().as_secs_f64() * 1000.0;
            span.in_scope(|| {
                if status.is_server_error() {
                    log_request_error!(request_id, status);
                }
                log_request_complete!(request_id, status.as_u16(), duration_ms);
            });

            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::{request, status_handler};
    use http::{Method, StatusCode};

    #[tokio::test]
    async fn test_passes_response_through() {
        let middleware = AccessLogMiddleware::new();
        let mut ctx = MiddlewareContext::with_peer_addr("127.0.0.1:9000".parse().unwrap());

        let response = middleware
            .process(
                &mut ctx,
                request(Method::POST, "/calculate"),
                Next::handler(status_handler(StatusCode::CREATED, "{}")),
            )
            .await;

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_logs_server_errors_without_altering_them() {
        let middleware = AccessLogMiddleware::new();
        let mut ctx = MiddlewareContext::new();

        let response = middleware
            .process(
                &mut ctx,
                request(Method::GET, "/health"),
                Next::handler(status_handler(StatusCode::BAD_GATEWAY, "")),
            )
            .await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
