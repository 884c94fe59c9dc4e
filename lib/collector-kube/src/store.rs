//! ConfigMap-backed artifact store

use crate::KubeClient;
use async_trait::async_trait;
use collector_core::{Artifact, ArtifactStore, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, DeleteParams, ObjectMeta, PostParams};
use std::collections::BTreeMap;
use tracing::debug;

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const MANAGED_BY_VALUE: &str = "openapi-collector";

/// ConfigMapStore keeps each artifact in a ConfigMap of the same name
pub struct ConfigMapStore {
    client: KubeClient,
    namespace: String,
}

impl ConfigMapStore {
    /// Create a store keeping artifacts in `namespace`
    pub fn new(client: KubeClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn api(&self) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone_client(), &self.namespace)
    }

    /// Build the ConfigMap holding an artifact
    pub fn config_map(namespace: &str, artifact: &Artifact) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(artifact.name.clone()),
                namespace: Some(namespace.to_string()),
                labels: Some(BTreeMap::from([(
                    MANAGED_BY_LABEL.to_string(),
                    MANAGED_BY_VALUE.to_string(),
                )])),
                ..Default::default()
            },
            data: Some(artifact.data.clone()),
            ..Default::default()
        }
    }

    /// Read an artifact back from its ConfigMap
    pub fn artifact(config_map: ConfigMap) -> Artifact {
        Artifact {
            name: config_map.metadata.name.unwrap_or_default(),
            data: config_map.data.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ArtifactStore for ConfigMapStore {
    async fn get(&self, name: &str) -> Result<Option<Artifact>> {
        let api = self.api();
        let config_map = self
            .client
            .call(&format!("get configmap {}", name), api.get_opt(name))
            .await?;
        Ok(config_map.map(Self::artifact))
    }

    async fn create(&self, artifact: &Artifact) -> Result<()> {
        let api = self.api();
        let config_map = Self::config_map(&self.namespace, artifact);
        self.client
            .call(
                &format!("create configmap {}", artifact.name),
                api.create(&PostParams::default(), &config_map),
            )
            .await?;

        debug!("Created configmap {}/{}", self.namespace, artifact.name);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let api = self.api();
        self.client
            .call(
                &format!("delete configmap {}", name),
                api.delete(name, &DeleteParams::default()),
            )
            .await?;

        debug!("Deleted configmap {}/{}", self.namespace, name);
        Ok(())
    }
}
