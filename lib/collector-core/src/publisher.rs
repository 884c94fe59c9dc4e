//! Artifact publishing by whole-object replacement

use crate::{Artifact, ArtifactStore, Result};
use tracing::{debug, info};

/// Publisher replaces remote artifacts with freshly generated content.
///
/// Each artifact is deleted (if present) and then created again. Between the
/// two calls the artifact is absent; consumers must tolerate that window.
pub struct Publisher<A> {
    store: A,
}

impl<A: ArtifactStore> Publisher<A> {
    /// Create a publisher writing to `store`
    pub fn new(store: A) -> Self {
        Self { store }
    }

    /// Get the underlying artifact store
    pub fn store(&self) -> &A {
        &self.store
    }

    /// Publish artifacts in order, stopping at the first failure
    pub async fn publish(&self, artifacts: &[Artifact]) -> Result<()> {
        for artifact in artifacts {
            self.replace(artifact).await?;
        }
        Ok(())
    }

    async fn replace(&self, artifact: &Artifact) -> Result<()> {
        if self.store.exists(&artifact.name).await? {
            debug!("Deleting existing artifact {}", artifact.name);
            self.store.delete(&artifact.name).await?;
        }

        self.store.create(artifact).await?;
        info!(
            "Published artifact {} ({} files)",
            artifact.name,
            artifact.data.len()
        );
        Ok(())
    }
}
