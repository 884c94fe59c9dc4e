//! Kubernetes client wrapper with a bounded per-call timeout

use collector_core::{CoreError, Result};
use kube::Client;
use std::future::Future;
use std::time::Duration;

/// KubeClient wraps the Kubernetes client used by the collector
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
    timeout: Duration,
}

impl KubeClient {
    /// Create a client from the in-cluster or local kubeconfig
    pub async fn try_default(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, timeout))
    }

    /// Wrap an existing client
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Get a clone of the Kubernetes client
    pub fn clone_client(&self) -> Client {
        self.client.clone()
    }

    /// Namespace the client resolves for namespaced calls by default
    pub fn default_namespace(&self) -> &str {
        self.client.default_namespace()
    }

    /// Run a cluster call, failing with [`CoreError::Timeout`] when it takes too long
    pub async fn call<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => Err(CoreError::Timeout(self.timeout, what.to_string())),
        }
    }
}
