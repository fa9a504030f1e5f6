//! # Trips Server
//!
//! The HTTP server of the trips service, built on hyper 1.x and tokio.
//!
//! - routing with `404`/`405` fallbacks ([`Router`])
//! - typed JSON handlers registered by operation id ([`HandlerRegistry`])
//! - the built-in `/health` endpoint ([`HealthCheck`])
//! - request body limits and timeouts
//! - graceful shutdown ([`ShutdownSignal`], [`ConnectionTracker`])
//!
//! Every request, including errors produced by the server itself, runs
//! through the configured [`Pipeline`](trips_middleware::Pipeline).
//!
//! ## Example
//!
//! ```rust,ignore
//! use trips_server::{HandlerRegistry, Server};
//! use http::Method;
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register("calculate", calculate);
//!
//! let server = Server::builder()
//!     .http_addr("0.0.0.0:8080")
//!     .route(Method::POST, "/calculate", "calculate")
//!     .handlers(handlers)
//!     .build();
//!
//! server.run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/trips-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod handler;
pub mod health;
pub mod router;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use handler::{HandlerContext, HandlerError, HandlerRegistry};
pub use health::{HealthCheck, HealthStatus, HEALTH_OPERATION, HEALTH_PATH};
pub use router::{RouteMatch, RouteOutcome, Router};
pub use server::{Server, ServerBuilder, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
