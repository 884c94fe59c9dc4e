//! Request path parsing and self-referential URL rewriting
//!
//! A document requested as `/{host}/{inner}/{file}` is fetched from
//! `{authority}/{inner}/{file}`, and every `servers[].url` in it is prefixed
//! with `/{host}` so clients keep resolving requests through the router.

use crate::ProxyError;
use collector_core::join_path;
use serde_json::{json, Value};

pub const SERVER_DESCRIPTION_SUFFIX: &str = "Not real base path";

/// A parsed document request path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRoute {
    pub host_label: String,
    /// Path between the host label and the document filename, may be empty
    pub inner_path: String,
}

/// Parse `/{hostLabel}[/{innerPath}]/{documentFilename}`
pub fn parse_document_path(path: &str, document_filename: &str) -> Option<DocumentRoute> {
    let base = path
        .strip_prefix('/')?
        .strip_suffix(document_filename)?
        .strip_suffix('/')?;

    let (host_label, inner_path) = base.split_once('/').unwrap_or((base, ""));
    if host_label.is_empty() {
        return None;
    }

    Some(DocumentRoute {
        host_label: host_label.to_string(),
        inner_path: inner_path.to_string(),
    })
}

/// Build the upstream URL for a document route.
///
/// The request's own authority is replaced by `authority` (assumed `http`
/// when it carries no scheme) and the host label prefix is dropped.
pub fn upstream_url(
    authority: &str,
    route: &DocumentRoute,
    document_filename: &str,
    query: Option<&str>,
) -> String {
    let authority = authority.trim_end_matches('/');
    let mut url = if authority.contains("://") {
        authority.to_string()
    } else {
        format!("http://{}", authority)
    };

    url.push('/');
    url.push_str(&join_path([route.inner_path.as_str(), document_filename]));

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Prefix every server URL with the host label and flag its description
pub fn rewrite_servers(document: &mut Value, host_label: &str) -> Result<(), ProxyError> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| ProxyError::InvalidDocument("document is not a JSON object".to_string()))?;

    let mut servers = match object.remove("servers") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(servers)) => servers,
        Some(_) => {
            return Err(ProxyError::InvalidDocument(
                "servers is not an array".to_string(),
            ))
        }
    };
    if servers.is_empty() {
        servers.push(json!({"url": "", "description": ""}));
    }

    for server in servers.iter_mut() {
        let server = server.as_object_mut().ok_or_else(|| {
            ProxyError::InvalidDocument("server entry is not an object".to_string())
        })?;

        let url = format!(
            "/{}{}",
            host_label,
            server.get("url").and_then(Value::as_str).unwrap_or("")
        );

        let mut description = server
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        if !description.is_empty() {
            description.push_str(" - ");
        }
        description.push_str(SERVER_DESCRIPTION_SUFFIX);

        server.insert("url".to_string(), Value::String(url));
        server.insert("description".to_string(), Value::String(description));
    }

    object.insert("servers".to_string(), Value::Array(servers));
    Ok(())
}
