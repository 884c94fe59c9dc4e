//! Service discovery across all namespaces

use crate::KubeClient;
use async_trait::async_trait;
use collector_core::{Result, ServiceMetadata, ServicePort, ServiceSource};
use k8s_openapi::api::core::v1::Service;
use kube::api::{Api, ListParams};
use tracing::debug;

/// KubeServiceSource lists every Service in the cluster
pub struct KubeServiceSource {
    client: KubeClient,
}

impl KubeServiceSource {
    /// Create a source listing through `client`
    pub fn new(client: KubeClient) -> Self {
        Self { client }
    }

    /// Project a Service onto the metadata the collector inspects
    pub fn service_metadata(service: &Service) -> ServiceMetadata {
        let metadata = &service.metadata;
        let ports = service
            .spec
            .as_ref()
            .and_then(|spec| spec.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|port| ServicePort {
                        name: port.name.clone(),
                        port: port.port,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ServiceMetadata {
            name: metadata.name.clone().unwrap_or_default(),
            namespace: metadata
                .namespace
                .clone()
                .unwrap_or_else(|| "default".to_string()),
            annotations: metadata.annotations.clone().unwrap_or_default(),
            ports,
        }
    }
}

#[async_trait]
impl ServiceSource for KubeServiceSource {
    async fn list_services(&self) -> Result<Vec<ServiceMetadata>> {
        let services: Api<Service> = Api::all(self.client.clone_client());
        let list = self
            .client
            .call("service listing", services.list(&ListParams::default()))
            .await?;

        debug!("Discovered {} services", list.items.len());
        Ok(list.items.iter().map(Self::service_metadata).collect())
    }
}
