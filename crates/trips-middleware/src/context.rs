//! Per-request pipeline state.
//!
//! [`MiddlewareContext`] is created by the server for every request and
//! handed mutably from stage to stage. Stages record what they learn here
//! (request id, client IP, matched operation) so later stages and the
//! handler can use it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};
use trips_core::RequestId;

/// The IP address a request is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIp(pub IpAddr);

impl fmt::Display for ClientIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mutable state carried through the pipeline.
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    peer_addr: Option<SocketAddr>,
    client_ip: Option<ClientIp>,
    operation_id: Option<String>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a context with a fresh request id and no peer address.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            peer_addr: None,
            client_ip: None,
            operation_id: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Creates a context for a request received from `peer_addr`.
    #[must_use]
    pub fn with_peer_addr(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr: Some(peer_addr),
            ..Self::new()
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request id.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the TCP peer address, if known.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Returns the resolved client IP.
    ///
    /// Falls back to the peer address until the real-IP stage has run.
    #[must_use]
    pub fn client_ip(&self) -> Option<ClientIp> {
        self.client_ip
            .or_else(|| self.peer_addr.map(|addr| ClientIp(addr.ip())))
    }

    /// Records the resolved client IP.
    pub fn set_client_ip(&mut self, ip: IpAddr) {
        self.client_ip = Some(ClientIp(ip));
    }

    /// Returns the matched operation, if routing has happened.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Records the matched operation.
    pub fn set_operation_id(&mut self, operation_id: impl Into<String>) {
        self.operation_id = Some(operation_id.into());
    }

    /// Returns when the request entered the pipeline.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time spent since the request entered the pipeline.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed value, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a stored value of type `T`.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}
