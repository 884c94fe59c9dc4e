//! Proxy configuration from environment variables

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ProxySettings {
    pub listen_addr: SocketAddr,
    pub upstream_header: String,
    pub document_filename: String,
    pub upstream_timeout: Duration,
    pub debug: bool,
    pub json_logs: bool,
}

impl ProxySettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen_addr = var("PROXY_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5000".to_string())
            .trim()
            .parse::<SocketAddr>()
            .context("PROXY_LISTEN_ADDR must be a socket address such as 0.0.0.0:5000")?;

        let timeout_secs = match var("PROXY_UPSTREAM_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .context("PROXY_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds")?,
            None => 30,
        };
        anyhow::ensure!(
            timeout_secs > 0,
            "PROXY_UPSTREAM_TIMEOUT_SECS must be greater than zero"
        );

        Ok(Self {
            listen_addr,
            upstream_header: var("PROXY_UPSTREAM_HEADER").unwrap_or_else(|| "ServerHost".to_string()),
            document_filename: var("PROXY_DOCUMENT_FILENAME")
                .unwrap_or_else(|| "openapi.json".to_string()),
            upstream_timeout: Duration::from_secs(timeout_secs),
            debug: var("PROXY_DEBUG")
                .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            json_logs: var("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<ProxySettings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProxySettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.listen_addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(settings.upstream_header, "ServerHost");
        assert_eq!(settings.document_filename, "openapi.json");
        assert_eq!(settings.upstream_timeout, Duration::from_secs(30));
        assert!(!settings.debug);
        assert!(!settings.json_logs);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("PROXY_LISTEN_ADDR", "127.0.0.1:8080"),
            ("PROXY_UPSTREAM_HEADER", "X-Upstream"),
            ("PROXY_UPSTREAM_TIMEOUT_SECS", "3"),
            ("PROXY_DEBUG", "1"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(settings.listen_addr.port(), 8080);
        assert_eq!(settings.upstream_header, "X-Upstream");
        assert_eq!(settings.upstream_timeout, Duration::from_secs(3));
        assert!(settings.debug);
        assert!(settings.json_logs);
    }

    #[test]
    fn test_invalid_values() {
        assert!(settings(&[("PROXY_LISTEN_ADDR", "port five thousand")]).is_err());
        assert!(settings(&[("PROXY_UPSTREAM_TIMEOUT_SECS", "0")]).is_err());
        assert!(settings(&[("PROXY_UPSTREAM_TIMEOUT_SECS", "-1")]).is_err());
    }
}
