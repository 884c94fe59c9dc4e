use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("missing {0} header")]
    MissingUpstreamHeader(String),

    #[error("no route for {0}")]
    RouteNotFound(String),

    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),

    #[error("invalid upstream document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ProxyError {
    /// HTTP status returned to the caller
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUpstreamHeader(_) => StatusCode::BAD_REQUEST,
            ProxyError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller; upstream causes are never included
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::MissingUpstreamHeader(_) => self.to_string(),
            ProxyError::RouteNotFound(_) => "not found".to_string(),
            ProxyError::MethodNotAllowed(_) => "method not allowed".to_string(),
            _ => "error".to_string(),
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Transport(e.to_string())
    }
}
