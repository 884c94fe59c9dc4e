//! Upstream document fetching

use crate::ProxyError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, warn};

/// Request headers never copied onto the upstream fetch. Content coding is
/// negotiated and decoded by the fetcher itself.
const UNFORWARDED_HEADERS: &[&str] = &[
    "host",
    "accept-encoding",
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Whether a client request header is copied onto the upstream fetch
pub fn is_forwarded(name: &str) -> bool {
    !UNFORWARDED_HEADERS
        .iter()
        .any(|skipped| skipped.eq_ignore_ascii_case(name))
}

/// A single upstream GET
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub url: String,
    /// Forwarded request headers, cookies included
    pub headers: Vec<(String, Vec<u8>)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the one outbound fetch of a proxied request
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// HTTP fetcher that never follows redirects and decodes compressed bodies
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher bounding each fetch by `timeout`
    pub fn new(timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::InvalidConfiguration(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Get the per-fetch timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn header_map(headers: &[(String, Vec<u8>)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_bytes(value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.append(name, value);
                }
                _ => warn!("Dropping unforwardable header {}", name),
            }
        }
        map
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        debug!("Fetching document from {}", request.url);

        let response = self
            .client
            .get(&request.url)
            .headers(Self::header_map(&request.headers))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("Upstream responded with status {} ({} bytes)", status, body.len());

        Ok(UpstreamResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{header_lines, reply, Upstream};
    use tokio::net::TcpListener;

    #[test]
    fn test_fetcher_creation() {
        let fetcher = HttpFetcher::new(Duration::from_secs(30)).unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_header_map_keeps_repeated_headers() {
        let map = HttpFetcher::header_map(&[
            ("accept".to_string(), b"application/json".to_vec()),
            ("cookie".to_string(), b"a=1".to_vec()),
            ("cookie".to_string(), b"b=2".to_vec()),
            ("bad header".to_string(), b"x".to_vec()),
        ]);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get_all("cookie").iter().count(), 2);
    }

    #[test]
    fn test_success_range() {
        let response = |status| UpstreamResponse {
            status,
            body: Vec::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(302).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn test_hop_by_hop_headers_not_forwarded() {
        assert!(is_forwarded("cookie"));
        assert!(is_forwarded("accept"));
        assert!(is_forwarded("authorization"));
        assert!(!is_forwarded("host"));
        assert!(!is_forwarded("Accept-Encoding"));
        assert!(!is_forwarded("connection"));
        assert!(!is_forwarded("transfer-encoding"));
        assert!(!is_forwarded("content-length"));
    }

    #[tokio::test]
    async fn test_fetch_sends_headers() {
        let upstream = Upstream::once(|_| reply("200 OK", &[], b"{}")).await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let response = fetcher
            .fetch(UpstreamRequest {
                url: format!("http://{}/v1/openapi.json", upstream.addr),
                headers: vec![
                    ("cookie".to_string(), b"session=abc".to_vec()),
                    ("accept".to_string(), b"application/json".to_vec()),
                ],
            })
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"{}");

        let head = upstream.request().await;
        assert!(head.starts_with("get /v1/openapi.json http/1.1\r\n"));
        let lines = header_lines(&head);
        assert!(lines.contains(&"cookie: session=abc"));
        assert!(lines.contains(&"accept: application/json"));
    }

    #[tokio::test]
    async fn test_fetch_does_not_follow_redirects() {
        let elsewhere = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let location = format!("http://{}/moved/openapi.json", elsewhere.local_addr().unwrap());
        let upstream = Upstream::once(move |_| {
            reply("302 Found", &[("location", location.as_str())], b"")
        })
        .await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let response = fetcher
            .fetch(UpstreamRequest {
                url: format!("http://{}/openapi.json", upstream.addr),
                headers: Vec::new(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, 302);
        assert!(!response.is_success());
        upstream.request().await;
        let followed =
            tokio::time::timeout(Duration::from_millis(200), elsewhere.accept()).await;
        assert!(followed.is_err());
    }
}
