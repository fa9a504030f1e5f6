//! Request routing.
//!
//! Maps a method and path to an operation id. Paths are compared segment by
//! segment with empty segments dropped, so `/calculate`, `/calculate/` and
//! `//calculate` are the same route.
//!
//! ```rust
//! use trips_server::{RouteOutcome, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::POST, "/calculate", "calculate");
//!
//! match router.match_route(&Method::POST, "/calculate/") {
//!     RouteOutcome::Matched(m) => assert_eq!(m.operation_id(), "calculate"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! assert!(matches!(
//!     router.match_route(&Method::GET, "/calculate"),
//!     RouteOutcome::MethodNotAllowed { .. }
//! ));
//! assert_eq!(router.match_route(&Method::GET, "/flights"), RouteOutcome::NotFound);
//! ```

use http::Method;

/// A matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation_id: String,
}

impl RouteMatch {
    /// The operation id registered for the route.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

/// Result of routing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A route matches both path and method.
    Matched(RouteMatch),
    /// Routes exist for the path, but not for this method.
    MethodNotAllowed {
        /// Methods registered for the path, in registration order.
        allowed: Vec<Method>,
    },
    /// Nothing is registered for the path.
    NotFound,
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<String>,
    operation_id: String,
}

impl Route {
    fn matches_path(&self, segments: &[&str]) -> bool {
        self.segments.len() == segments.len()
            && self.segments.iter().zip(segments).all(|(a, b)| a == b)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Method and path router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `operation_id` for `method` on `path`.
    pub fn add_route(&mut self, method: Method, path: impl AsRef<str>, operation_id: impl Into<String>) {
        self.routes.push(Route {
            method,
            segments: split_path(path.as_ref()).map(str::to_string).collect(),
            operation_id: operation_id.into(),
        });
    }

    /// Number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Whether any route is registered for `operation_id`.
    #[must_use]
    pub fn has_operation(&self, operation_id: &str) -> bool {
        self.routes.iter().any(|r| r.operation_id == operation_id)
    }

    /// Routes a request.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteOutcome {
        let segments: Vec<&str> = split_path(path).collect();
        let mut allowed = Vec::new();

        for route in self.routes.iter().filter(|r| r.matches_path(&segments)) {
            if route.method == method {
                return RouteOutcome::Matched(RouteMatch {
                    operation_id: route.operation_id.clone(),
                });
            }
            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        if allowed.is_empty() {
            RouteOutcome::NotFound
        } else {
            RouteOutcome::MethodNotAllowed { allowed }
        }
    }
}
