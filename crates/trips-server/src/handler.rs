//! Handler registration and dispatch.
//!
//! Handlers are async functions from a typed request to a typed response,
//! registered under an operation id. The registry owns the JSON boundary:
//! it decodes the body, calls the handler and encodes the result.
//!
//! Decoding follows one rule for every operation:
//!
//! - an empty body fails with `"cannot read request body"`,
//! - a body that does not decode into the request type fails with
//!   `"cannot decode json"` and the decoder's diagnostics.
//!
//! ```rust,ignore
//! use trips_server::{HandlerContext, HandlerRegistry};
//! use trips_core::ServiceError;
//!
//! async fn calculate(_ctx: HandlerContext, req: CalculateRequest) -> Result<CalculateResponse, ServiceError> {
//!     ...
//! }
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("calculate", calculate);
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use trips_core::{RequestId, ServiceError};

/// Message for a request without a body.
pub const EMPTY_BODY_MESSAGE: &str = "cannot read request body";

/// Message for a body that does not decode.
pub const INVALID_JSON_MESSAGE: &str = "cannot decode json";

/// Boxed result of an erased handler.
pub type BoxedHandlerResult = Pin<Box<dyn Future<Output = Result<Bytes, HandlerError>> + Send>>;

/// A type-erased handler.
pub type ErasedHandler = Arc<dyn Fn(HandlerContext, Bytes) -> BoxedHandlerResult + Send + Sync>;

/// What a handler knows about the request beyond its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerContext {
    request_id: RequestId,
    operation_id: String,
}

impl HandlerContext {
    /// Creates a context.
    #[must_use]
    pub fn new(request_id: RequestId, operation_id: impl Into<String>) -> Self {
        Self {
            request_id,
            operation_id: operation_id.into(),
        }
    }

    /// The request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// The operation being invoked.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

/// Errors from invoking a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Nothing is registered under the operation id.
    #[error("no handler registered for operation '{0}'")]
    NotRegistered(String),

    /// The request failed to decode or the handler rejected it.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The handler's response could not be encoded.
    #[error("failed to serialize response: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl From<HandlerError> for ServiceError {
    fn from(error: HandlerError) -> Self {
        match error {
            HandlerError::Service(error) => error,
            HandlerError::NotRegistered(operation) => {
                Self::internal(format!("no handler registered for operation '{operation}'"))
            }
            HandlerError::Serialization(source) => {
                Self::internal_with_source("failed to serialize response", source)
            }
        }
    }
}

/// Decodes a JSON request body.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ServiceError::decode(EMPTY_BODY_MESSAGE));
    }
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::decode_with_details(INVALID_JSON_MESSAGE, e.to_string()))
}

/// Handlers by operation id.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ErasedHandler>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut operations: Vec<&String> = self.handlers.keys().collect();
        operations.sort();
        f.debug_struct("HandlerRegistry")
            .field("operations", &operations)
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler that takes a JSON request body.
    ///
    /// Registering the same operation id twice replaces the first handler.
    pub fn register<Req, Res, F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(HandlerContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, ServiceError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: HandlerContext, body: Bytes| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let request: Req = decode_body(&body)?;
                let response = handler(ctx, request).await?;
                let bytes = serde_json::to_vec(&response).map_err(HandlerError::Serialization)?;
                Ok(Bytes::from(bytes))
            })
        });

        self.handlers.insert(operation_id.into(), erased);
    }

    /// Registers a handler that ignores the request body.
    pub fn register_no_body<Res, F, Fut>(&mut self, operation_id: impl Into<String>, handler: F)
    where
        Res: Serialize + Send + 'static,
        F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, ServiceError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |ctx: HandlerContext, _body: Bytes| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let response = handler(ctx).await?;
                let bytes = serde_json::to_vec(&response).map_err(HandlerError::Serialization)?;
                Ok(Bytes::from(bytes))
            })
        });

        self.handlers.insert(operation_id.into(), erased);
    }

    /// Whether a handler is registered for `operation_id`.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invokes the handler registered for the context's operation.
    pub async fn invoke(&self, ctx: HandlerContext, body: Bytes) -> Result<Bytes, HandlerError> {
        let handler = self
            .handlers
            .get(ctx.operation_id())
            .cloned()
            .ok_or_else(|| HandlerError::NotRegistered(ctx.operation_id().to_string()))?;
        handler(ctx, body).await
    }
}
