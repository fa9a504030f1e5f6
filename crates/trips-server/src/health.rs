//! The health endpoint.
//!
//! `GET /health` (and `HEAD`) answers `200` with a [`HealthStatus`] while
//! the server accepts traffic, and `503` once shutdown has begun so load
//! balancers stop routing to it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Path the health endpoint is served on.
pub const HEALTH_PATH: &str = "/health";

/// Operation id of the health endpoint.
pub const HEALTH_OPERATION: &str = "health";

/// Health response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
    service: String,
    version: String,
    uptime_seconds: u64,
}

impl HealthStatus {
    /// Creates a status.
    #[must_use]
    pub fn new(
        status: impl Into<String>,
        service: impl Into<String>,
        version: impl Into<String>,
        uptime: Duration,
    ) -> Self {
        Self {
            status: status.into(),
            service: service.into(),
            version: version.into(),
            uptime_seconds: uptime.as_secs(),
        }
    }

    /// `"healthy"` or `"unhealthy"`.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whole seconds since the server started.
    #[must_use]
    pub const fn uptime_seconds(&self) -> u64 {
        self.uptime_seconds
    }

    /// Whether the status is `"healthy"`.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Reports liveness and whether the server still takes traffic.
///
/// Clones share the same readiness flag.
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    start_time: Instant,
    ready: Arc<AtomicBool>,
}

impl HealthCheck {
    /// Creates a ready health check.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        let status = if self.is_ready() { "healthy" } else { "unhealthy" };
        HealthStatus::new(status, &self.service, &self.version, self.uptime())
    }

    /// Marks the server as (not) taking traffic.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Whether the server takes traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Time since the health check was created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}
