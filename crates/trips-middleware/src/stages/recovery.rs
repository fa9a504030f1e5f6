//! Panic recovery.
//!
//! A panic anywhere downstream would otherwise tear down the connection
//! task. This stage catches it and answers `500` instead.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use trips_core::ServiceError;

/// Converts downstream panics into `500` responses.
#[derive(Debug, Clone, Default)]
pub struct RecoveryMiddleware;

impl RecoveryMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

impl Middleware for RecoveryMiddleware {
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            match AssertUnwindSafe(next.run(ctx, request)).catch_unwind().await {
                Ok(response) => response,
                Err(payload) => {
                    tracing::error!(
                        request_id = %ctx.request_id(),
                        panic = panic_message(payload.as_ref()),
                        "handler panicked"
                    );
                    Response::service_error(
                        &ServiceError::internal("internal server error"),
                        Some(ctx.request_id()),
                    )
                }
            }
        })
    }
}
