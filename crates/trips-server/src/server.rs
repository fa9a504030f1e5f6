//! The HTTP server.
//!
//! [`Server::dispatch`] is the whole request path and does not need a
//! socket, which is what `trips-test` drives. [`Server::run`] adds the
//! hyper accept loop, connection limits and graceful shutdown around it.
//!
//! Per request:
//!
//! 1. `GET`/`HEAD /health` is answered directly.
//! 2. The body is read, bounded by `max_body_bytes` (`413`) and
//!    `request_timeout` (`408`).
//! 3. The request runs through the pipeline. At its end the router picks
//!    the operation (`404`/`405` otherwise) and the handler runs, again
//!    bounded by `request_timeout` (`504`).

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use trips_core::ServiceError;
use trips_middleware::types::{body_bytes, APPLICATION_JSON};
use trips_middleware::{BoxFuture, MiddlewareContext, Pipeline, Request, Response, ResponseExt};

use crate::config::{ServerConfig, ServerConfigBuilder};
use crate::handler::{HandlerContext, HandlerRegistry, EMPTY_BODY_MESSAGE};
use crate::health::{HealthCheck, HEALTH_OPERATION, HEALTH_PATH};
use crate::router::{RouteOutcome, Router};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Errors that stop the server from running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address does not parse.
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Why it does not parse.
        reason: String,
    },

    /// The listen address could not be bound.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure of the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The trips HTTP server.
pub struct Server {
    config: ServerConfig,
    pipeline: Pipeline,
    router: Arc<Router>,
    handlers: Arc<HandlerRegistry>,
    health: HealthCheck,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("pipeline", &self.pipeline)
            .field("routes", &self.router.route_count())
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// The server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The handler registry.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// The health check.
    #[must_use]
    pub fn health(&self) -> &HealthCheck {
        &self.health
    }

    /// The middleware pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handles one request end to end.
    ///
    /// `remote_addr` is the peer of the connection, if there is one.
    pub async fn dispatch<B>(&self, request: http::Request<B>, remote_addr: Option<SocketAddr>) -> Response
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let route = self
            .router
            .match_route(request.method(), request.uri().path());

        if let RouteOutcome::Matched(ref matched) = route {
            if matched.operation_id() == HEALTH_OPERATION {
                return self.health_response(request.method());
            }
        }

        let (parts, body) = request.into_parts();
        let (body, body_error) = match self.read_body(body).await {
            Ok(body) => (body, None),
            Err(error) => (Bytes::new(), Some(error)),
        };
        let request = Request::from_parts(parts, Full::new(body));

        let ctx = remote_addr.map_or_else(MiddlewareContext::new, MiddlewareContext::with_peer_addr);
        let handlers = Arc::clone(&self.handlers);
        let timeout = self.config.request_timeout();

        let handler = move |ctx: &mut MiddlewareContext, request: Request| -> BoxFuture<'static, Response> {
            let request_id = ctx.request_id();

            let operation_id = match (body_error, route) {
                (Some(error), _) => return ready_error(error, ctx),
                (None, RouteOutcome::NotFound) => return ready_error(ServiceError::NotFound, ctx),
                (None, RouteOutcome::MethodNotAllowed { allowed }) => {
                    let error = ServiceError::method_not_allowed(allowed.iter().map(Method::as_str));
                    return ready_error(error, ctx);
                }
                (None, RouteOutcome::Matched(matched)) => matched.operation_id().to_string(),
            };

            ctx.set_operation_id(operation_id.clone());
            let handler_ctx = HandlerContext::new(request_id, operation_id);

            Box::pin(async move {
                let body = body_bytes(request.into_body()).await;
                let result = match tokio::time::timeout(timeout, handlers.invoke(handler_ctx, body)).await {
                    Ok(result) => result.map_err(ServiceError::from),
                    Err(_) => {
                        tracing::warn!(
                            request_id = %request_id,
                            timeout_ms = timeout.as_millis() as u64,
                            "handler timed out"
                        );
                        Err(ServiceError::Timeout)
                    }
                };

                match result {
                    Ok(bytes) => json_bytes(StatusCode::OK, bytes),
                    Err(error) => Response::service_error(&error, Some(request_id)),
                }
            })
        };

        self.pipeline.process(ctx, request, handler).await
    }

    async fn read_body<B>(&self, body: B) -> Result<Bytes, ServiceError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let limit = self.config.max_body_bytes();
        let collect = Limited::new(body, limit).collect();

        match tokio::time::timeout(self.config.request_timeout(), collect).await {
            Ok(Ok(collected)) => Ok(collected.to_bytes()),
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                Err(ServiceError::PayloadTooLarge { limit_bytes: limit })
            }
            Ok(Err(e)) => Err(ServiceError::decode_with_details(EMPTY_BODY_MESSAGE, e.to_string())),
            Err(_) => Err(ServiceError::RequestTimeout),
        }
    }

    fn health_response(&self, method: &Method) -> Response {
        let status = self.health.status();
        let code = if status.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        let mut response = Response::json(code, &status);
        if method == Method::HEAD {
            *response.body_mut() = Full::new(Bytes::new());
        }
        response
    }

    /// Binds the configured address and serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Binds the configured address and serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.serve(listener, shutdown).await
    }

    /// Serves connections from `listener` until `shutdown` fires, then
    /// drains in-flight connections for up to the shutdown timeout.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            service.name = %self.health.service(),
            service.version = %self.health.version(),
            "server listening"
        );

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        if server.at_capacity(&tracker) {
                            tracing::warn!(client.ip = %remote_addr.ip(), "connection limit reached, refusing connection");
                            drop(stream);
                        } else {
                            let token = tracker.acquire();
                            let server = Arc::clone(&server);
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, remote_addr, shutdown).await {
                                    tracing::debug!(client.ip = %remote_addr.ip(), error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        server.health.set_ready(false);

        let drain = server.config.shutdown_timeout();
        tracing::info!(
            active_connections = tracker.active_connections(),
            timeout_secs = drain.as_secs(),
            "draining connections"
        );

        if tokio::time::timeout(drain, tracker.wait_for_shutdown()).await.is_err() {
            tracing::warn!(
                active_connections = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            );
        }

        tracing::info!("server stopped");
        Ok(())
    }

    fn at_capacity(&self, tracker: &ConnectionTracker) -> bool {
        self.config
            .max_connections()
            .is_some_and(|max| tracker.active_connections() >= max)
    }

    async fn handle_connection(
        self: Arc<Self>,
        stream: TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let server = Arc::clone(&self);
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(server.dispatch(request, Some(remote_addr)).await) }
        });

        let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
        tokio::pin!(conn);

        let mut draining = false;
        loop {
            tokio::select! {
                result = conn.as_mut() => return result,
                () = shutdown.recv(), if !draining => {
                    conn.as_mut().graceful_shutdown();
                    draining = true;
                }
            }
        }
    }
}

fn ready_error(error: ServiceError, ctx: &MiddlewareContext) -> BoxFuture<'static, Response> {
    let response = Response::service_error(&error, Some(ctx.request_id()));
    Box::pin(async move { response })
}

fn json_bytes(status: StatusCode, body: Bytes) -> Response {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}

/// Builder for [`Server`].
///
/// ```rust
/// use trips_server::Server;
/// use http::Method;
/// use std::time::Duration;
///
/// let server = Server::builder()
///     .http_addr("127.0.0.1:0")
///     .request_timeout(Duration::from_secs(2))
///     .route(Method::POST, "/calculate", "calculate")
///     .service_name("trips")
///     .build();
///
/// assert!(server.router().has_operation("calculate"));
/// assert!(server.router().has_operation("health"));
/// ```
pub struct ServerBuilder {
    config: ServerConfigBuilder,
    router: Router,
    handlers: HandlerRegistry,
    pipeline: Pipeline,
    service_name: String,
    service_version: String,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// Default configuration, no routes besides `/health`, empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ServerConfigBuilder::new(),
            router: Router::new(),
            handlers: HandlerRegistry::new(),
            pipeline: Pipeline::empty(),
            service_name: "trips".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Sets the listen address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config = self.config.http_addr(addr);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.request_timeout(timeout);
        self
    }

    /// Sets the shutdown drain period.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.shutdown_timeout(timeout);
        self
    }

    /// Caps concurrent connections.
    #[must_use]
    pub fn max_connections(mut self, max: Option<usize>) -> Self {
        self.config = self.config.max_connections(max);
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config = self.config.max_body_bytes(limit);
        self
    }

    /// Routes `method` on `path` to `operation_id`.
    #[must_use]
    pub fn route(mut self, method: Method, path: &str, operation_id: &str) -> Self {
        self.router.add_route(method, path, operation_id);
        self
    }

    /// Sets the handlers.
    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Sets the middleware pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Service name reported by `/health`.
    #[must_use]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Service version reported by `/health`.
    #[must_use]
    pub fn service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        let mut router = self.router;
        router.add_route(Method::GET, HEALTH_PATH, HEALTH_OPERATION);
        router.add_route(Method::HEAD, HEALTH_PATH, HEALTH_OPERATION);

        Server {
            config: self.config.build(),
            pipeline: self.pipeline,
            router: Arc::new(router),
            handlers: Arc::new(self.handlers),
            health: HealthCheck::new(self.service_name, self.service_version),
        }
    }
}
