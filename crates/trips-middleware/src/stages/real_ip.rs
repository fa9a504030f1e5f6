//! Client IP resolution.
//!
//! Behind a proxy the TCP peer is the proxy itself. This stage looks at the
//! usual forwarding headers, in order:
//!
//! 1. `True-Client-IP`
//! 2. `X-Real-IP`
//! 3. the first entry of `X-Forwarded-For`
//!
//! and records the first one that parses as an IP address. Without any of
//! them, the peer address stays in effect.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::net::IpAddr;

const TRUE_CLIENT_IP: &str = "true-client-ip";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolves the client IP from forwarding headers.
#[derive(Debug, Clone, Default)]
pub struct RealIpMiddleware;

impl RealIpMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns the forwarded client IP, if the request names one.
    #[must_use]
    pub fn forwarded_ip(request: &Request) -> Option<IpAddr> {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        header(TRUE_CLIENT_IP)
            .and_then(|value| value.trim().parse().ok())
            .or_else(|| header(X_REAL_IP).and_then(|value| value.trim().parse().ok()))
            .or_else(|| {
                header(X_FORWARDED_FOR)
                    .and_then(|value| value.split(',').next())
                    .and_then(|first| first.trim().parse().ok())
            })
    }
}

impl Middleware for RealIpMiddleware {
    fn name(&self) -> &'static str {
        "real_ip"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(ip) = Self::forwarded_ip(&request) {
                ctx.set_client_ip(ip);
            }
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::{ok_handler, request_with};
    use http::Method;

    async fn resolve(headers: &[(&str, &str)]) -> Option<String> {
        let mut ctx = MiddlewareContext::with_peer_addr("192.0.2.10:40000".parse().unwrap());
        let request = request_with(Method::GET, "/health", headers, "");
        RealIpMiddleware::new()
            .process(&mut ctx, request, Next::handler(ok_handler()))
            .await;
        ctx.client_ip().map(|ip| ip.to_string())
    }

    #[tokio::test]
    async fn test_peer_address_without_headers() {
        assert_eq!(resolve(&[]).await.as_deref(), Some("192.0.2.10"));
    }

    #[tokio::test]
    async fn test_true_client_ip_wins() {
        let ip = resolve(&[
            (X_FORWARDED_FOR, "198.51.100.1"),
            (X_REAL_IP, "198.51.100.2"),
            (TRUE_CLIENT_IP, "198.51.100.3"),
        ])
        .await;
        assert_eq!(ip.as_deref(), Some("198.51.100.3"));
    }

    #[tokio::test]
    async fn test_real_ip_before_forwarded_for() {
        let ip = resolve(&[(X_FORWARDED_FOR, "198.51.100.1"), (X_REAL_IP, "198.51.100.2")]).await;
        assert_eq!(ip.as_deref(), Some("198.51.100.2"));
    }

    #[tokio::test]
    async fn test_first_forwarded_for_entry() {
        let ip = resolve(&[(X_FORWARDED_FOR, "2001:db8::1, 10.0.0.1, 10.0.0.2")]).await;
        assert_eq!(ip.as_deref(), Some("2001:db8::1"));
    }

    #[tokio::test]
    async fn test_garbage_header_is_ignored() {
        let ip = resolve(&[(X_REAL_IP, "not an ip")]).await;
        assert_eq!(ip.as_deref(), Some("192.0.2.10"));
    }
}
