//! Remote artifact store abstraction

use crate::{Artifact, CoreError, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Named multi-file objects read by downstream consumers
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Artifact>>;

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.get(name).await?.is_some())
    }

    /// Create a new object; fails if one with the same name exists
    async fn create(&self, artifact: &Artifact) -> Result<()>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Artifact>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Artifact>>> {
        self.objects
            .lock()
            .map_err(|_| CoreError::Internal("memory store lock poisoned".to_string()))
    }

    /// Names of the stored artifacts in order
    pub fn names(&self) -> Vec<String> {
        self.objects()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<Artifact>> {
        Ok(self.objects()?.get(name).cloned())
    }

    async fn create(&self, artifact: &Artifact) -> Result<()> {
        let mut objects = self.objects()?;
        if objects.contains_key(&artifact.name) {
            return Err(CoreError::ArtifactExists(artifact.name.clone()));
        }
        objects.insert(artifact.name.clone(), artifact.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.objects()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CoreError::ArtifactNotFound(name.to_string()))
    }
}
