//! Request lifecycle hooks around the proxy handler

use hyper::Request;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, span, Instrument, Level};
use uuid::Uuid;

/// Per-request data passed through the middleware chain
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub method: String,
    pub path: String,
    pub started: Instant,
}

impl RequestContext {
    /// Create a context with a fresh request id
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            started: Instant::now(),
        }
    }

    /// Milliseconds since the request arrived
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

/// Middleware trait for observing requests and responses
#[async_trait::async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str {
        "UnnamedMiddleware"
    }

    async fn on_request(&self, _context: &RequestContext) {}

    async fn on_response(&self, _context: &RequestContext, _status: u16) {}

    /// Called with the full failure cause, which never reaches the caller
    async fn on_error(&self, _context: &RequestContext, _status: u16, _error: &str) {}
}

/// Chain of middleware to execute in order
pub struct MiddlewareChain {
    middleware: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    /// Create a new middleware chain
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
        }
    }

    /// Add middleware to the chain
    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Number of middleware in the chain
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Request hooks run in insertion order
    pub async fn on_request(&self, context: &RequestContext) {
        for mw in &self.middleware {
            debug!(middleware = mw.name(), "on_request");
            mw.on_request(context).await;
        }
    }

    /// Response hooks run in reverse order
    pub async fn on_response(&self, context: &RequestContext, status: u16) {
        for mw in self.middleware.iter().rev() {
            debug!(middleware = mw.name(), "on_response");
            mw.on_response(context, status).await;
        }
    }

    /// Error hooks run in insertion order
    pub async fn on_error(&self, context: &RequestContext, status: u16, error: &str) {
        for mw in &self.middleware {
            let span = span!(Level::DEBUG, "middleware", name = mw.name());
            mw.on_error(context, status, error).instrument(span).await;
        }
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Access log: one line per request, causes of server errors at ERROR
pub struct LoggingMiddleware;

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "LoggingMiddleware"
    }

    async fn on_request(&self, context: &RequestContext) {
        debug!("Request: {} {}", context.method, context.path);
    }

    async fn on_response(&self, context: &RequestContext, status: u16) {
        info!(
            "{} {} -> {} ({}ms)",
            context.method,
            context.path,
            status,
            context.elapsed_ms()
        );
    }

    async fn on_error(&self, context: &RequestContext, status: u16, error: &str) {
        if status >= 500 {
            error!("Error serving {} {}: {}", context.method, context.path, error);
        } else {
            debug!("Rejected {} {}: {}", context.method, context.path, error);
        }
    }
}
