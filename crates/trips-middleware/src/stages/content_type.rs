//! Content-type enforcement.
//!
//! Requests carrying a body must declare `application/json`. A declared
//! charset must be `utf-8`; an absent one is accepted, JSON being UTF-8 by
//! default. Bodiless requests (health checks, probes) skip the check.

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{body_bytes, Request, Response, ResponseExt};
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use http_body_util::Full;
use trips_core::ServiceError;

/// Rejects bodies that are not JSON in UTF-8 with `415`.
#[derive(Debug, Clone)]
pub struct ContentTypeMiddleware {
    media_types: Vec<String>,
    charsets: Vec<String>,
}

impl ContentTypeMiddleware {
    /// Accepts `application/json` with an optional `utf-8` charset.
    #[must_use]
    pub fn json() -> Self {
        Self {
            media_types: vec!["application/json".to_string()],
            charsets: vec!["utf-8".to_string()],
        }
    }

    /// Adds another accepted media type.
    #[must_use]
    pub fn allow_media_type(mut self, media_type: &str) -> Self {
        self.media_types.push(media_type.to_ascii_lowercase());
        self
    }

    /// Checks the `Content-Type` header of a request that has a body.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), ServiceError> {
        let value = headers
            .get(CONTENT_TYPE)
            .ok_or_else(|| ServiceError::unsupported_media_type("missing content type"))?
            .to_str()
            .map_err(|_| ServiceError::unsupported_media_type("unreadable content type"))?
            .to_ascii_lowercase();

        let mut params = value.split(';');
        let media_type = params.next().unwrap_or_default().trim();
        if !self.media_types.iter().any(|allowed| allowed == media_type) {
            return Err(ServiceError::unsupported_media_type(format!(
                "unsupported content type '{media_type}', expected {}",
                self.media_types.join(" or ")
            )));
        }

        let charset = params
            .filter_map(|param| param.trim().strip_prefix("charset="))
            .map(|charset| charset.trim().trim_matches('"'))
            .next();

        match charset {
            Some(charset) if !self.charsets.iter().any(|allowed| allowed == charset) => {
                Err(ServiceError::unsupported_media_type(format!(
                    "unsupported charset '{charset}', expected {}",
                    self.charsets.join(" or ")
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for ContentTypeMiddleware {
    fn default() -> Self {
        Self::json()
    }
}

impl Middleware for ContentTypeMiddleware {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let body = body_bytes(body).await;

            if !body.is_empty() {
                if let Err(error) = self.check(&parts.headers) {
                    tracing::debug!(request_id = %ctx.request_id(), error = %error, "rejected content type");
                    return Response::service_error(&error, Some(ctx.request_id()));
                }
            }

            next.run(ctx, Request::from_parts(parts, Full::new(body))).await
        })
    }
}
