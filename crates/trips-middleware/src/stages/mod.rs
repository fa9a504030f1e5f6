//! The standard middleware stages.

pub mod access_log;
pub mod content_type;
pub mod error_normalization;
pub mod no_cache;
pub mod rate_limit;
pub mod real_ip;
pub mod recovery;
pub mod request_id;

pub use access_log::AccessLogMiddleware;
pub use content_type::ContentTypeMiddleware;
pub use error_normalization::ErrorNormalizationMiddleware;
pub use no_cache::NoCacheMiddleware;
pub use rate_limit::{RateLimitBuilder, RateLimitKey, RateLimitMiddleware};
pub use real_ip::RealIpMiddleware;
pub use recovery::RecoveryMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::context::MiddlewareContext;
    use crate::middleware::BoxFuture;
    use crate::types::{Request, Response, ResponseExt};
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use http_body_util::Full;

    pub fn request(method: Method, uri: &str) -> Request {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    pub fn request_with(method: Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Request {
        let mut builder = http::Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    pub fn ok_handler() -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> {
        |_ctx, _req| Box::pin(async { Response::json(StatusCode::OK, &serde_json::json!({"ok": true})) })
    }

    pub fn status_handler(
        status: StatusCode,
        body: &'static str,
    ) -> impl FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> {
        move |_ctx, _req| {
            Box::pin(async move {
                let mut response = http::Response::new(Full::new(Bytes::from_static(body.as_bytes())));
                *response.status_mut() = status;
                response
            })
        }
    }
}
