//! # Trips Test
//!
//! In-memory HTTP testing for services built on `trips-server`.
//!
//! Requests go through [`Server::dispatch`](trips_server::Server::dispatch),
//! so routing, the middleware pipeline, body limits and timeouts all apply,
//! but no port is bound.
//!
//! ## Example
//!
//! ```ignore
//! use trips_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_calculate() {
//!     let client = TestClient::new(server);
//!
//!     let response = client
//!         .post("/calculate")
//!         .json(&json!({"data": {"flights": [["SFO", "EWR"]]}}))
//!         .send()
//!         .await;
//!
//!     response.assert_status_code(200);
//!     assert_eq!(response.json_value().unwrap()["data"]["trip"][0], "SFO");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/trips-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest, DEFAULT_PEER_ADDR};
pub use error::TestError;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
