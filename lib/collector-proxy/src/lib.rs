//! Path-rewrite proxy for API documents served under a rewritten prefix
pub mod error;
pub mod forwarder;
pub mod http;
pub mod middleware;
pub mod rewrite;

#[cfg(test)]
mod testing;

pub use error::ProxyError;
pub use forwarder::{is_forwarded, DocumentFetcher, HttpFetcher, UpstreamRequest, UpstreamResponse};
pub use http::{ProxyConfig, SpecProxy};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareChain, RequestContext};
