//! Fixed-order middleware pipeline.
//!
//! Pre-handler stages run outermost first; post-handler stages sit directly
//! around the handler and therefore only see responses the handler produced.
//! Once built, a pipeline cannot be reordered.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A shared middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An immutable chain of middleware stages.
#[derive(Clone)]
pub struct Pipeline {
    pre_handler: Vec<BoxedMiddleware>,
    post_handler: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Starts building a pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// A pipeline with no stages; requests go straight to the handler.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            pre_handler: Vec::new(),
            post_handler: Vec::new(),
        }
    }

    /// Runs `request` through every stage and finally `handler`.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        self.chain(handler).run(&mut ctx, request).await
    }

    fn chain<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        self.pre_handler
            .iter()
            .chain(&self.post_handler)
            .rev()
            .fold(Next::handler(handler), |next, stage| {
                Next::stage(stage.as_ref(), next)
            })
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pre_handler
            .iter()
            .chain(&self.post_handler)
            .map(|stage| stage.name())
            .collect()
    }

    /// Total number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.pre_handler.len() + self.post_handler.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    pre_handler: Vec<BoxedMiddleware>,
    post_handler: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage that runs before the handler.
    #[must_use]
    pub fn pre_handler<M: Middleware>(mut self, middleware: M) -> Self {
        self.pre_handler.push(Arc::new(middleware));
        self
    }

    /// Appends a stage that wraps the handler directly.
    #[must_use]
    pub fn post_handler<M: Middleware>(mut self, middleware: M) -> Self {
        self.post_handler.push(Arc::new(middleware));
        self
    }

    /// Finishes the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            pre_handler: self.pre_handler,
            post_handler: self.post_handler,
        }
    }
}

/// The stages of the standard pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Request id propagation.
    RequestId = 1,
    /// Client IP resolution.
    RealIp = 2,
    /// Access logging.
    AccessLog = 3,
    /// Panic recovery.
    Recovery = 4,
    /// Rate limiting.
    RateLimit = 5,
    /// Content-type enforcement.
    ContentType = 6,
    /// No-cache headers.
    NoCache = 7,
    /// Error envelope normalization (post-handler).
    ErrorNormalization = 8,
}

impl Stage {
    /// Returns true for stages that run before the handler.
    #[must_use]
    pub const fn is_pre_handler(self) -> bool {
        (self as u8) < (Self::ErrorNormalization as u8)
    }

    /// The stage name, as returned by the middleware's `name()`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RequestId => "request_id",
            Self::RealIp => "real_ip",
            Self::AccessLog => "access_log",
            Self::Recovery => "recovery",
            Self::RateLimit => "rate_limit",
            Self::ContentType => "content_type",
            Self::NoCache => "no_cache",
            Self::ErrorNormalization => "error_normalization",
        }
    }

    /// All stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 8] {
        [
            Self::RequestId,
            Self::RealIp,
            Self::AccessLog,
            Self::Recovery,
            Self::RateLimit,
            Self::ContentType,
            Self::NoCache,
            Self::ErrorNormalization,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseExt;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        order: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Middleware for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                self.order.lock().unwrap().push(self.name);
                next.run(ctx, request).await
            })
        }
    }

    struct Reject;

    impl Middleware for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut MiddlewareContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async { Response::empty(StatusCode::FORBIDDEN) })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/calculate")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let recorder = |name| Recorder {
            name,
            order: Arc::clone(&order),
        };

        let pipeline = Pipeline::builder()
            .pre_handler(recorder("first"))
            .pre_handler(recorder("second"))
            .post_handler(recorder("third"))
            .build();

        let handler_order = Arc::clone(&order);
        let response = pipeline
            .process(MiddlewareContext::new(), request(), move |_ctx, _req| {
                handler_order.lock().unwrap().push("handler");
                Box::pin(async { Response::empty(StatusCode::OK) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["first", "second", "third", "handler"]
        );
        assert_eq!(pipeline.stage_names(), vec!["first", "second", "third"]);
        assert_eq!(pipeline.stage_count(), 3);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let pipeline = Pipeline::builder().pre_handler(Reject).build();

        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::empty(StatusCode::OK) })
            })
            .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::empty();
        let response = pipeline
            .process(MiddlewareContext::new(), request(), |_ctx, _req| {
                Box::pin(async { Response::empty(StatusCode::OK) })
            })
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(pipeline.stage_count(), 0);
    }

    #[test]
    fn test_stage_order() {
        let stages = Stage::all();
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
        assert!(Stage::NoCache.is_pre_handler());
        assert!(!Stage::ErrorNormalization.is_pre_handler());
    }
}
