use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Host label {host} of {incoming} is already used by {existing}")]
    HostLabelConflict {
        host: String,
        existing: String,
        incoming: String,
    },

    #[error("Artifact already exists: {0}")]
    ArtifactExists(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::error::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(std::time::Duration, String),

    #[error("Internal error: {0}")]
    Internal(String),
}
