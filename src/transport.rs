//! HTTP transport
//!
//! The dispatcher talks to platforms only through the [`Transport`] trait, so
//! tests can substitute a scripted double and production code uses
//! [`ReqwestTransport`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::TransportError;

/// Request body
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`
    Json(serde_json::Value),
    /// Sent verbatim as UTF-8 text
    Text(String),
}

impl RequestBody {
    /// Size of the encoded body in bytes
    pub fn byte_len(&self) -> usize {
        match self {
            RequestBody::Json(value) => value.to_string().len(),
            RequestBody::Text(text) => text.len(),
        }
    }
}

/// A single POST to a platform
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    /// Target URL
    pub url: String,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: RequestBody,
    /// Proxy override for this call
    pub proxy: Option<String>,
    /// Hard timeout for this call
    pub timeout: Duration,
}

impl HttpRequest {
    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and body of a platform response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Build a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body parsed as JSON, if it is JSON
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Thin HTTP client abstraction
///
/// Implementations must honour the per-call proxy and timeout and must never
/// block longer than `request.timeout`. Non-2xx responses are returned as
/// `Ok`; only failures to get a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a request and return the platform's response
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] on timeout, connection failure, an
    /// unusable proxy or any other failure to obtain a response.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`
///
/// Direct requests share one client. Proxied requests get one client per
/// proxy URL, built on first use and kept for connection reuse. Clones share
/// both.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    proxied: Arc<Mutex<HashMap<String, reqwest::Client>>>,
}

impl ReqwestTransport {
    /// Transport with a default client for direct connections
    pub fn new() -> Self {
        Self::default()
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client, TransportError> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };

        // The map is only ever inserted into, so a poisoned lock still holds valid clients
        let mut proxied = self.proxied.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = proxied.get(proxy) {
            return Ok(client.clone());
        }

        let invalid = |e: reqwest::Error| TransportError::InvalidProxy {
            proxy: proxy.to_string(),
            reason: e.to_string(),
        };
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all(proxy).map_err(invalid)?)
            .build()
            .map_err(invalid)?;
        proxied.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = self.client_for(request.proxy.as_deref())?;
        let mut builder = client.post(&request.url).timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder.body(text.clone()),
        };

        let timeout = request.timeout;
        let response = match tokio::time::timeout(timeout, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(classify(e, timeout)),
            Err(_) => return Err(TransportError::Timeout(timeout)),
        };

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify(e, timeout))?;

        tracing::trace!(status, bytes = body.len(), "platform responded");
        Ok(HttpResponse { status, body })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(url: String, body: RequestBody) -> HttpRequest {
        HttpRequest {
            url,
            headers: vec![("X-Test".into(), "yes".into())],
            body,
            proxy: None,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn posts_json_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("X-Test", "yes"))
            .and(body_json(serde_json::json!({"text": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let response = ReqwestTransport::new()
            .send(&request(
                format!("{}/hook", server.uri()),
                RequestBody::Json(serde_json::json!({"text": "hi"})),
            ))
            .await
            .unwrap();

        assert_eq!(response, HttpResponse::new(200, "ok"));
    }

    #[tokio::test]
    async fn posts_text_and_returns_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/topic"))
            .and(body_string("热点 report"))
            .respond_with(ResponseTemplate::new(413).set_body_string("too large"))
            .mount(&server)
            .await;

        let response = ReqwestTransport::new()
            .send(&request(
                format!("{}/topic", server.uri()),
                RequestBody::Text("热点 report".into()),
            ))
            .await
            .unwrap();

        assert_eq!(response.status, 413);
        assert_eq!(response.body, "too large");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let mut req = request(server.uri(), RequestBody::Text("x".into()));
        req.timeout = Duration::from_millis(100);

        let err = ReqwestTransport::new().send(&req).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        // Port 9 (discard) on localhost is essentially never listening
        let req = request(
            "http://127.0.0.1:9/hook".into(),
            RequestBody::Text("x".into()),
        );

        let err = ReqwestTransport::new().send(&req).await.unwrap_err();
        assert!(
            matches!(
                err,
                TransportError::Connect(_) | TransportError::Request(_)
            ),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn malformed_proxy_is_rejected_before_sending() {
        let mut req = request(
            "http://127.0.0.1:9/hook".into(),
            RequestBody::Text("x".into()),
        );
        req.proxy = Some("::not a proxy::".into());

        let transport = ReqwestTransport::new();
        let err = transport.send(&req).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidProxy { .. }));
        assert!(transport.proxied.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn proxied_clients_are_built_once_per_proxy() {
        let transport = ReqwestTransport::new();
        let shared = transport.clone();

        transport.client_for(Some("http://127.0.0.1:7890")).unwrap();
        transport.client_for(Some("http://127.0.0.1:7890")).unwrap();
        assert_eq!(transport.proxied.lock().unwrap().len(), 1);

        shared.client_for(Some("http://10.0.0.1:3128")).unwrap();
        shared.client_for(None).unwrap();
        let cached = transport.proxied.lock().unwrap();
        assert_eq!(cached.len(), 2, "clones share the cache");
        assert!(cached.contains_key("http://127.0.0.1:7890"));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = request("http://x".into(), RequestBody::Text(String::new()));
        assert_eq!(req.header("x-test"), Some("yes"));
        assert_eq!(req.header("missing"), None);
    }
}
