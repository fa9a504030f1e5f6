//! No-cache headers.
//!
//! Trip results depend on the request body only, so conditional requests
//! are meaningless here. Conditional request headers are dropped and every
//! response is marked uncacheable.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use http::header::{self, HeaderName, HeaderValue};

const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 UTC";
const CACHE_CONTROL: &str = "no-cache, no-store, no-transform, must-revalidate, private, max-age=0";

/// Conditional request headers removed before the handler runs.
const CONDITIONAL_HEADERS: [HeaderName; 6] = [
    header::ETAG,
    header::IF_MODIFIED_SINCE,
    header::IF_MATCH,
    header::IF_NONE_MATCH,
    header::IF_RANGE,
    header::IF_UNMODIFIED_SINCE,
];

/// Marks every response as uncacheable.
#[derive(Debug, Clone, Default)]
pub struct NoCacheMiddleware;

impl NoCacheMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for NoCacheMiddleware {
    fn name(&self) -> &'static str {
        "no_cache"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        mut request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            for name in &CONDITIONAL_HEADERS {
                request.headers_mut().remove(name);
            }

            let mut response = next.run(ctx, request).await;

            let headers = response.headers_mut();
            headers.insert(header::EXPIRES, HeaderValue::from_static(EPOCH));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
            headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
            headers.insert(
                HeaderName::from_static("x-accel-expires"),
                HeaderValue::from_static("0"),
            );
            response
        })
    }
}
