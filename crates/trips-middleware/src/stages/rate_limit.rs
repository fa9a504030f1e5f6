//! Request rate limiting.
//!
//! A sliding window per key: the count of the current window plus the count
//! of the previous window, weighted by how much of it still overlaps. Keys
//! are the resolved client IP by default, so this stage must run after
//! `real_ip`.
//!
//! ```ignore
//! use trips_middleware::stages::RateLimitMiddleware;
//! use std::time::Duration;
//!
//! let rate_limit = RateLimitMiddleware::builder()
//!     .limit(100)
//!     .window(Duration::from_secs(1))
//!     .per_ip()
//!     .build();
//! ```

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::HeaderValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tokio::time::Instant;
use trips_core::ServiceError;

/// Rate limit header names.
pub mod headers {
    /// Maximum requests allowed in the window.
    pub const LIMIT: &str = "x-ratelimit-limit";
    /// Remaining requests in the current window.
    pub const REMAINING: &str = "x-ratelimit-remaining";
    /// Unix timestamp when the window resets.
    pub const RESET: &str = "x-ratelimit-reset";
}

/// Key used when no client IP could be determined.
const UNKNOWN_CLIENT: &str = "unknown";

/// Key shared by all requests under [`RateLimitKey::Global`].
const GLOBAL_KEY: &str = "global";

/// What requests are counted against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RateLimitKey {
    /// One window per client IP.
    #[default]
    ClientIp,
    /// A single window for every request.
    Global,
}

/// Rejects requests over the configured rate with `429 Too Many Requests`.
///
/// Admitted responses carry `X-RateLimit-Limit`, `X-RateLimit-Remaining`
/// and `X-RateLimit-Reset`. Rejections carry `Retry-After`.
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    limit: u64,
    window: Duration,
    key: RateLimitKey,
    store: Arc<Mutex<Store>>,
}

#[derive(Debug)]
struct Store {
    windows: HashMap<String, Window>,
    last_pruned: Instant,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    prev_count: u64,
    started_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Allowed { remaining: u64, reset_in: Duration },
    Limited { reset_in: Duration },
}

/// Builder for [`RateLimitMiddleware`].
#[derive(Debug, Clone)]
pub struct RateLimitBuilder {
    limit: u64,
    window: Duration,
    key: RateLimitKey,
}

impl Default for RateLimitBuilder {
    fn default() -> Self {
        Self {
            limit: 100,
            window: Duration::from_secs(1),
            key: RateLimitKey::ClientIp,
        }
    }
}

impl RateLimitBuilder {
    /// 100 requests per second per client IP.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of requests allowed per window.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the window length.
    #[must_use]
    pub const fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Counts each client IP separately.
    #[must_use]
    pub const fn per_ip(mut self) -> Self {
        self.key = RateLimitKey::ClientIp;
        self
    }

    /// Counts all requests together.
    #[must_use]
    pub const fn global(mut self) -> Self {
        self.key = RateLimitKey::Global;
        self
    }

    /// Builds the stage. Zero limits and windows are raised to one.
    #[must_use]
    pub fn build(self) -> RateLimitMiddleware {
        RateLimitMiddleware {
            limit: self.limit.max(1),
            window: self.window.max(Duration::from_millis(1)),
            key: self.key,
            store: Arc::new(Mutex::new(Store {
                windows: HashMap::new(),
                last_pruned: Instant::now(),
            })),
        }
    }
}

impl RateLimitMiddleware {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> RateLimitBuilder {
        RateLimitBuilder::new()
    }

    /// Requests allowed per window.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    fn key_for(&self, ctx: &MiddlewareContext) -> String {
        match self.key {
            RateLimitKey::ClientIp => ctx
                .client_ip()
                .map_or_else(|| UNKNOWN_CLIENT.to_string(), |ip| ip.to_string()),
            RateLimitKey::Global => GLOBAL_KEY.to_string(),
        }
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        let window = self.window;
        let mut store = self.store.lock().await;

        if now.duration_since(store.last_pruned) >= window * 2 {
            store
                .windows
                .retain(|_, w| now.duration_since(w.started_at) < window * 2);
            store.last_pruned = now;
        }

        let entry = store.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            prev_count: 0,
            started_at: now,
        });

        let elapsed = now.duration_since(entry.started_at);
        if elapsed >= window {
            let windows_passed = elapsed.as_millis() / window.as_millis().max(1);
            entry.prev_count = if windows_passed >= 2 { 0 } else { entry.count };
            entry.count = 0;
            entry.started_at += window * u32::try_from(windows_passed).unwrap_or(u32::MAX);
            if entry.started_at > now {
                entry.started_at = now;
            }
        }

        let in_window = now.duration_since(entry.started_at);
        let prev_weight = 1.0 - in_window.as_secs_f64() / window.as_secs_f64();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let weighted = entry.count + (entry.prev_count as f64 * prev_weight) as u64;
        let reset_in = window.saturating_sub(in_window);

        if weighted >= self.limit {
            Decision::Limited { reset_in }
        } else {
            entry.count += 1;
            Decision::Allowed {
                remaining: self.limit.saturating_sub(weighted + 1),
                reset_in,
            }
        }
    }

    fn add_headers(&self, response: &mut Response, remaining: u64, reset_in: Duration) {
        let reset_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            + reset_in.as_secs();

        let headers = response.headers_mut();
        headers.insert(headers::LIMIT, HeaderValue::from(self.limit));
        headers.insert(headers::REMAINING, HeaderValue::from(remaining));
        headers.insert(headers::RESET, HeaderValue::from(reset_at));
    }
}

/// Whole seconds until `reset_in` has passed, never less than one.
fn retry_after_secs(reset_in: Duration) -> u64 {
    let secs = reset_in.as_secs();
    if reset_in.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let key = self.key_for(ctx);

            match self.check(&key).await {
                Decision::Allowed {
                    remaining,
                    reset_in,
                } => {
                    let mut response = next.run(ctx, request).await;
                    self.add_headers(&mut response, remaining, reset_in);
                    response
                }
                Decision::Limited { reset_in } => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        client.key = %key,
                        limit = self.limit,
                        "rate limit exceeded"
                    );
                    let error = ServiceError::rate_limited(retry_after_secs(reset_in));
                    let mut response = Response::service_error(&error, Some(ctx.request_id()));
                    self.add_headers(&mut response, 0, reset_in);
                    response
                }
            }
        })
    }
}
