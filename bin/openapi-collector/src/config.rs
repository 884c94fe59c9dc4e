//! Collector configuration from environment variables

use anyhow::{Context, Result};
use collector_core::GeneratorSettings;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct CollectorConfig {
    pub interval: Duration,
    pub request_timeout: Duration,
    pub debug: bool,
    pub json_logs: bool,
    /// Namespace of the published ConfigMaps, client default when unset
    pub namespace: Option<String>,
    pub generator: GeneratorSettings,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let seconds = |key: &str, default: u64| -> Result<Duration> {
            let secs = match var(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a whole number of seconds", key))?,
                None => default,
            };
            anyhow::ensure!(secs > 0, "{} must be greater than zero", key);
            Ok(Duration::from_secs(secs))
        };
        let flag = |key: &str| {
            var(key)
                .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false)
        };

        let defaults = GeneratorSettings::default();
        let generator = GeneratorSettings {
            router_artifact: var("COLLECTOR_ROUTER_CONFIGMAP").unwrap_or(defaults.router_artifact),
            ui_artifact: var("COLLECTOR_UI_CONFIGMAP").unwrap_or(defaults.ui_artifact),
            proxy_upstream: var("COLLECTOR_PROXY_UPSTREAM").unwrap_or(defaults.proxy_upstream),
            upstream_header: var("COLLECTOR_UPSTREAM_HEADER").unwrap_or(defaults.upstream_header),
            document_filename: var("COLLECTOR_DOCUMENT_FILENAME")
                .unwrap_or(defaults.document_filename),
        };
        anyhow::ensure!(
            generator.router_artifact != generator.ui_artifact,
            "router and UI ConfigMaps must have different names"
        );

        Ok(Self {
            interval: seconds("COLLECTOR_INTERVAL_SECS", 30)?,
            request_timeout: seconds("COLLECTOR_REQUEST_TIMEOUT_SECS", 10)?,
            debug: flag("COLLECTOR_DEBUG"),
            json_logs: var("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
            namespace: var("COLLECTOR_NAMESPACE"),
            generator,
        })
    }
}
