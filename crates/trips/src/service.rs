//! Assembly of the trips service from its configuration.

use http::Method;
use trips_config::TripsConfig;
use trips_middleware::stages::{
    AccessLogMiddleware, ContentTypeMiddleware, ErrorNormalizationMiddleware, NoCacheMiddleware,
    RateLimitMiddleware, RealIpMiddleware, RecoveryMiddleware, RequestIdMiddleware,
};
use trips_middleware::Pipeline;
use trips_server::{HandlerRegistry, Server};

use crate::api::{self, CALCULATE_OPERATION, CALCULATE_PATH};

/// Builds the middleware pipeline.
///
/// Rate limiting is left out when disabled in `config`; every other stage
/// is always present and in the same order.
#[must_use]
pub fn pipeline(config: &TripsConfig) -> Pipeline {
    let mut builder = Pipeline::builder()
        .pre_handler(RequestIdMiddleware::new())
        .pre_handler(RealIpMiddleware::new())
        .pre_handler(AccessLogMiddleware::new())
        .pre_handler(RecoveryMiddleware::new());

    if config.rate_limit.enabled {
        builder = builder.pre_handler(
            RateLimitMiddleware::builder()
                .limit(u64::from(config.rate_limit.requests))
                .window(config.rate_limit.window())
                .per_ip()
                .build(),
        );
    }

    builder
        .pre_handler(ContentTypeMiddleware::json())
        .pre_handler(NoCacheMiddleware::new())
        .post_handler(ErrorNormalizationMiddleware::new())
        .build()
}

/// Builds the server with routes, handlers and pipeline.
#[must_use]
pub fn build_server(config: &TripsConfig) -> Server {
    let mut handlers = HandlerRegistry::new();
    api::register(&mut handlers);

    Server::builder()
        .http_addr(config.server.http_addr.clone())
        .request_timeout(config.server.request_timeout())
        .shutdown_timeout(config.server.shutdown_timeout())
        .max_connections(config.server.max_connections)
        .max_body_bytes(config.server.max_body_bytes)
        .route(Method::POST, CALCULATE_PATH, CALCULATE_OPERATION)
        .handlers(handlers)
        .pipeline(pipeline(config))
        .service_name(config.service.name.clone())
        .service_version(config.service.version.clone())
        .build()
}
