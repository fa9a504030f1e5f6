//! Test client for in-memory HTTP testing.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use trips_server::Server;

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;

/// Peer address requests appear to come from unless overridden.
pub const DEFAULT_PEER_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40_000);

/// Sends requests straight into a [`Server`] without a socket.
///
/// ```ignore
/// use trips_test::TestClient;
///
/// let client = TestClient::new(server);
/// let response = client.get("/health").send().await;
/// assert_eq!(response.status_code(), 200);
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    server: Arc<Server>,
    default_headers: Vec<(String, String)>,
    peer_addr: Option<SocketAddr>,
}

impl TestClient {
    /// Wraps `server`.
    pub fn new(server: Server) -> Self {
        Self::from_shared(Arc::new(server))
    }

    /// Wraps an already shared server.
    pub fn from_shared(server: Arc<Server>) -> Self {
        Self {
            server,
            default_headers: Vec::new(),
            peer_addr: Some(DEFAULT_PEER_ADDR),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the peer address, or `None` for a request without one.
    pub fn with_peer_addr(mut self, peer_addr: Option<SocketAddr>) -> Self {
        self.peer_addr = peer_addr;
        self
    }

    /// The server under test.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a HEAD request builder.
    pub fn head(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::head(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    async fn send_internal(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self
            .server
            .dispatch(request.into_http_request(), self.peer_addr)
            .await;
        TestResponse::from_http(response).await
    }
}

/// A request builder bound to a [`TestClient`].
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, mut builder: TestRequestBuilder) -> Self {
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built; use [`try_send`](Self::try_send)
    /// to handle that as an error.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.send_internal(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;
    use trips_core::ServiceError;
    use trips_middleware::stages::{RealIpMiddleware, RequestIdMiddleware};
    use trips_middleware::Pipeline;
    use trips_server::{HandlerContext, HandlerRegistry};

    #[derive(serde::Deserialize)]
    struct Greeting {
        name: String,
    }

    fn client() -> TestClient {
        let mut handlers = HandlerRegistry::new();
        handlers.register("greet", |_ctx: HandlerContext, req: Greeting| async move {
            if req.name.is_empty() {
                return Err(ServiceError::decode("name is empty"));
            }
            Ok(json!({ "greeting": format!("hello {}", req.name) }))
        });

        let pipeline = Pipeline::builder()
            .pre_handler(RequestIdMiddleware::new())
            .pre_handler(RealIpMiddleware::new())
            .build();

        TestClient::new(
            Server::builder()
                .route(Method::POST, "/greet", "greet")
                .handlers(handlers)
                .pipeline(pipeline)
                .build(),
        )
    }

    #[tokio::test]
    async fn test_post_json() {
        let response = client()
            .post("/greet")
            .json(&json!({"name": "sfo"}))
            .send()
            .await;

        response.assert_status(StatusCode::OK);
        assert_eq!(response.json_value().unwrap()["greeting"], "hello sfo");
        assert!(response.header("x-request-id").is_some());
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = client()
            .post("/greet")
            .json(&json!({"name": ""}))
            .send()
            .await;
        response.assert_error(StatusCode::BAD_REQUEST, "DECODE_ERROR");
    }

    #[tokio::test]
    async fn test_default_headers() {
        let id = "0190b6e4-5a3c-7c6f-9d1e-2f3a4b5c6d7e";
        let client = client().with_default_header("x-request-id", id);

        let response = client.get("/health").send().await;
        response.assert_status_code(200);

        let response = client.get("/nowhere").send().await;
        response.assert_header("x-request-id", id);
        assert_eq!(
            response.error_envelope().unwrap().request_id.as_deref(),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_invalid_header_is_error() {
        let result = client().get("/health").header("bad header", "x").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_peer_addr() {
        let client = client().with_peer_addr(None);
        let response = client.head("/health").send().await;
        response.assert_status_code(200);
        assert!(response.body().is_empty());
        assert!(response.header("x-request-id").is_none());
    }
}
