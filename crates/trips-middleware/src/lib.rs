//! # Trips Middleware
//!
//! The middleware pipeline every request to the trips service passes through.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → RequestId → RealIp → AccessLog → Recovery → RateLimit → ContentType → NoCache → Handler
//!                                                                                              ↓
//! Response ←──────────────────────────────────── ErrorNormalization ←──────────────────────────┘
//! ```
//!
//! | Stage | Middleware          | Purpose                                             |
//! |-------|---------------------|-----------------------------------------------------|
//! | 1     | Request ID          | Propagate or generate `x-request-id` (UUID v7)      |
//! | 2     | Real IP             | Resolve the client IP from proxy headers            |
//! | 3     | Access Log          | Structured start/complete log events                |
//! | 4     | Recovery            | Turn handler panics into `500`                      |
//! | 5     | Rate Limit          | Per-client sliding window, `429` when exceeded      |
//! | 6     | Content Type        | Require `application/json` in UTF-8, `415` if not   |
//! | 7     | No Cache            | Strip conditional headers, add no-cache headers     |
//! | 8     | Error Normalization | Standard error envelope with request id             |
//!
//! ## Example
//!
//! ```
//! use trips_middleware::pipeline::Stage;
//!
//! let stages = Stage::all();
//! assert_eq!(stages[0].name(), "request_id");
//! assert_eq!(stages[7].name(), "error_normalization");
//! ```

#![doc(html_root_url = "https://docs.rs/trips-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::{ClientIp, MiddlewareContext};
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{Pipeline, PipelineBuilder, Stage};
pub use types::{Request, Response, ResponseExt};
