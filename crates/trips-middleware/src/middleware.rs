//! The middleware trait.
//!
//! A stage receives the request, may inspect or rewrite it, and either calls
//! [`Next::run`] to continue or returns its own response to short-circuit.
//!
//! ```ignore
//! use trips_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
//!
//! struct Timing;
//!
//! impl Middleware for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(elapsed_ms = ctx.elapsed().as_millis() as u64, "done");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal handler at the end of a chain.
pub type HandlerFn<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// A single pipeline stage.
///
/// Stages must call `next.run()` at most once. Not calling it short-circuits
/// the pipeline.
pub trait Middleware: Send + Sync + 'static {
    /// Stage name used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The rest of the chain after the current stage.
pub struct Next<'a> {
    inner: Link<'a>,
}

enum Link<'a> {
    Stage {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(HandlerFn<'a>),
}

impl<'a> Next<'a> {
    /// Wraps `next` behind `middleware`.
    pub(crate) fn stage(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: Link::Stage {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Terminates the chain with `handler`.
    pub fn handler<F>(handler: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: Link::Handler(Box::new(handler)),
        }
    }

    /// Runs the next stage, or the handler if none are left.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.inner {
            Link::Stage { middleware, next } => middleware.process(ctx, request, *next).await,
            Link::Handler(handler) => handler(ctx, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    struct Tag(&'static str);

    impl Middleware for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                ctx.set_operation_id(self.0);
                let mut response = next.run(ctx, request).await;
                response
                    .headers_mut()
                    .insert("x-tag", http::HeaderValue::from_static("seen"));
                response
            })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/calculate")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_handler_only() {
        let mut ctx = MiddlewareContext::new();
        let next = Next::handler(|_ctx, _req| {
            Box::pin(async { Response::empty(StatusCode::ACCEPTED) })
        });

        let response = next.run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_stage_wraps_handler() {
        let tag = Tag("outer");
        let mut ctx = MiddlewareContext::new();
        let next = Next::stage(
            &tag,
            Next::handler(|ctx, _req| {
                let seen = ctx.operation_id().map(ToString::to_string);
                Box::pin(async move {
                    assert_eq!(seen.as_deref(), Some("outer"));
                    Response::empty(StatusCode::OK)
                })
            }),
        );

        let response = next.run(&mut ctx, request()).await;
        assert_eq!(response.headers().get("x-tag").unwrap(), "seen");
        assert_eq!(tag.name(), "outer");
    }
}
