//! Kubernetes collaborators for the OpenAPI collector
pub mod client;
pub mod discovery;
pub mod store;

pub use client::KubeClient;
pub use discovery::KubeServiceSource;
pub use store::ConfigMapStore;
