//! Request handling for the document proxy

use crate::forwarder::{is_forwarded, DocumentFetcher, UpstreamRequest};
use crate::middleware::{MiddlewareChain, RequestContext};
use crate::rewrite::{parse_document_path, rewrite_servers, upstream_url};
use crate::ProxyError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};

pub const HEALTHZ_PATH: &str = "/healthz";

/// Proxy settings shared with the generated router configuration
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    upstream_header: HeaderName,
    upstream_header_display: String,
    document_filename: String,
}

impl ProxyConfig {
    /// Validate the upstream-authority header name and document filename
    pub fn new(upstream_header: &str, document_filename: &str) -> Result<Self, ProxyError> {
        let header = HeaderName::from_bytes(upstream_header.as_bytes()).map_err(|e| {
            ProxyError::InvalidConfiguration(format!(
                "invalid upstream header {:?}: {}",
                upstream_header, e
            ))
        })?;
        let document_filename = document_filename.trim_matches('/');
        if document_filename.is_empty() {
            return Err(ProxyError::InvalidConfiguration(
                "document filename must not be empty".to_string(),
            ));
        }

        Ok(Self {
            upstream_header: header,
            upstream_header_display: upstream_header.to_string(),
            document_filename: document_filename.to_string(),
        })
    }

    /// Get the header carrying the upstream authority
    pub fn upstream_header(&self) -> &HeaderName {
        &self.upstream_header
    }

    /// Get the document filename without slashes
    pub fn document_filename(&self) -> &str {
        &self.document_filename
    }
}

/// Stateless handler rewriting API documents fetched from upstream services
pub struct SpecProxy<F> {
    config: ProxyConfig,
    fetcher: F,
    middleware: MiddlewareChain,
}

impl<F: DocumentFetcher> SpecProxy<F> {
    /// Create a proxy fetching through `fetcher`
    pub fn new(config: ProxyConfig, fetcher: F, middleware: MiddlewareChain) -> Self {
        Self {
            config,
            fetcher,
            middleware,
        }
    }

    /// Get the proxy configuration
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Handle a request; always produces a response
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>> {
        let context = RequestContext::from_request(&req);
        let span = info_span!("request", id = %context.request_id);
        let (parts, _) = req.into_parts();

        async {
            self.middleware.on_request(&context).await;

            let response = match self.respond(&parts).await {
                Ok(response) => response,
                Err(e) => {
                    let status = e.status();
                    self.middleware
                        .on_error(&context, status.as_u16(), &e.to_string())
                        .await;
                    json_response(status, &json!({ "msg": e.public_message() }))
                }
            };

            self.middleware
                .on_response(&context, response.status().as_u16())
                .await;
            response
        }
        .instrument(span)
        .await
    }

    async fn respond(&self, req: &Parts) -> Result<Response<Full<Bytes>>, ProxyError> {
        let path = req.uri.path();

        if path == HEALTHZ_PATH {
            if req.method == Method::GET || req.method == Method::HEAD {
                return Ok(Response::new(Full::new(Bytes::new())));
            }
            return Err(ProxyError::MethodNotAllowed(req.method.to_string()));
        }

        let route = parse_document_path(path, &self.config.document_filename)
            .ok_or_else(|| ProxyError::RouteNotFound(path.to_string()))?;
        if req.method != Method::GET {
            return Err(ProxyError::MethodNotAllowed(req.method.to_string()));
        }

        let authority = req
            .headers
            .get(&self.config.upstream_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ProxyError::MissingUpstreamHeader(self.config.upstream_header_display.clone())
            })?;

        let url = upstream_url(
            authority,
            &route,
            &self.config.document_filename,
            req.uri.query(),
        );
        let headers = req
            .headers
            .iter()
            .filter(|(name, _)| {
                is_forwarded(name.as_str()) && **name != self.config.upstream_header
            })
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();

        let upstream = self.fetcher.fetch(UpstreamRequest { url, headers }).await?;
        if !upstream.is_success() {
            return Err(ProxyError::UpstreamStatus(upstream.status));
        }

        let mut document: Value = serde_json::from_slice(&upstream.body)?;
        rewrite_servers(&mut document, &route.host_label)?;
        debug!("Rewrote servers for {}", route.host_label);

        Ok(json_response(StatusCode::OK, &document))
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    // Serializing a Value cannot fail.
    let body = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
