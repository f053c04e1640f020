//! HTTP transport boundary for all outbound provider traffic.
//!
//! Adapters never talk to reqwest directly; they issue [`HttpRequest`]s
//! through the [`HttpTransport`] trait. Production code uses
//! [`ReqwestTransport`]; unit tests swap in the in-memory [`MockTransport`]
//! so no provider test ever opens a socket.

use async_trait::async_trait;
use thiserror::Error;

/// Minimal HTTP method enum. Providers are consumed read-only, so only GET
/// is issued today; the enum leaves room for authenticated POST endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// HTTP headers represented as key/value pairs.
///
/// Header names are treated case-insensitively by helper functions.
pub type HttpHeaders = Vec<(String, String)>;

/// A minimal HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
}

impl HttpRequest {
    /// Build a GET request with a bearer token and JSON accept header, the
    /// shape every registry adapter uses.
    #[must_use]
    pub fn get_json(url: impl Into<String>, token: Option<&str>) -> Self {
        let mut headers: HttpHeaders = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers,
        }
    }

    /// Build a plain GET request for an HTML page.
    #[must_use]
    pub fn get_html(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![("Accept".to_string(), "text/html".to_string())],
        }
    }
}

/// A minimal HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    /// The body decoded as UTF-8, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: String, url: String },
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Get the first header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A real HTTP transport backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (k, v) in request.headers {
            builder = builder.header(&k, &v);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let mut headers: HttpHeaders = Vec::new();
        for (name, value) in resp.headers().iter() {
            headers.push((
                name.as_str().to_string(),
                value.to_str().unwrap_or_default().to_string(),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ---------- Test-only mock transport ----------

#[cfg(test)]
use std::collections::{HashMap, VecDeque};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// In-memory mock transport.
///
/// Designed for unit tests: no sockets, no loopback HTTP servers. Responses
/// registered for the same (method, url) key are returned in FIFO order. A
/// route can also be registered to hang forever, which is how adapter
/// timeout behavior is exercised under the paused test clock.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockTransportInner {
    routes: HashMap<(HttpMethod, String), VecDeque<HttpResponse>>,
    hanging: std::collections::HashSet<(HttpMethod, String)>,
    requests: Vec<HttpRequest>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for a method + URL.
    pub fn push_response(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        response: HttpResponse,
    ) {
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner
            .routes
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    /// Shorthand for a 200 response with the given body.
    pub fn push_ok(&self, method: HttpMethod, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.push_response(
            method,
            url,
            HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: body.into(),
            },
        );
    }

    /// Shorthand for an empty response with the given status.
    pub fn push_status(&self, method: HttpMethod, url: impl Into<String>, status: u16) {
        self.push_response(
            method,
            url,
            HttpResponse {
                status,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );
    }

    /// Make requests to this route never complete.
    pub fn push_hang(&self, method: HttpMethod, url: impl Into<String>) {
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner.hanging.insert((method, url.into()));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        let inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner.requests.clone()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let key = (request.method, request.url.clone());
        let hang;
        let response;
        {
            let mut inner = self
                .inner
                .lock()
                .expect("mock transport lock should not be poisoned");
            inner.requests.push(request);
            hang = inner.hanging.contains(&key);
            response = inner.routes.get_mut(&key).and_then(|q| q.pop_front());
        }

        if hang {
            std::future::pending::<()>().await;
            unreachable!("pending future never resolves");
        }

        match response {
            Some(resp) => Ok(resp),
            None => Err(HttpError::NoMockResponse {
                method: key.0.as_str().to_string(),
                url: key.1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_get_is_case_insensitive_and_returns_first_match() {
        let headers: HttpHeaders = vec![
            ("Content-Type".to_string(), "text/html".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
        ];
        assert_eq!(header_get(&headers, "content-type"), Some("text/html"));
        assert_eq!(header_get(&headers, "CONTENT-TYPE"), Some("text/html"));
        assert_eq!(header_get(&headers, "missing"), None);
    }

    #[test]
    fn get_json_sets_accept_and_bearer_headers() {
        let req = HttpRequest::get_json("https://api.fei.org/horse/GER40739", Some("tok"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(header_get(&req.headers, "accept"), Some("application/json"));
        assert_eq!(header_get(&req.headers, "authorization"), Some("Bearer tok"));

        let anon = HttpRequest::get_json("https://api.fei.org/horse/GER40739", None);
        assert_eq!(header_get(&anon.headers, "authorization"), None);
    }

    #[tokio::test]
    async fn mock_transport_returns_registered_response_and_records_request() {
        let transport = MockTransport::new();
        let url = "https://example.com/api";

        transport.push_ok(HttpMethod::Get, url, b"hello".to_vec());

        let req = HttpRequest::get_json(url, None);
        let resp = transport.send(req.clone()).await.expect("mock response");
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body_text(), "hello");

        assert_eq!(transport.requests(), vec![req]);
    }

    #[tokio::test]
    async fn mock_transport_errors_when_no_response_is_registered() {
        let transport = MockTransport::new();
        let err = transport
            .send(HttpRequest::get_json("https://example.com/missing", None))
            .await
            .expect_err("missing mock should error");
        match err {
            HttpError::NoMockResponse { method, url } => {
                assert_eq!(method, "GET");
                assert_eq!(url, "https://example.com/missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn mock_transport_hang_route_never_resolves() {
        let transport = MockTransport::new();
        let url = "https://example.com/slow";
        transport.push_hang(HttpMethod::Get, url);

        let send = transport.send(HttpRequest::get_html(url));
        let result =
            tokio::time::timeout(std::time::Duration::from_secs(30), send).await;
        assert!(result.is_err(), "hanging route should outlive the timeout");
    }
}
