//! Core reconciliation functionality for the OpenAPI collector
//!
//! This library provides:
//! - Spec model and annotation-driven extraction from service metadata
//! - Spec index keyed by namespace and name
//! - Deterministic generation of the router and UI artifacts
//! - Artifact publishing over a pluggable store
//! - The periodic reconciliation driver

pub mod annotations;
pub mod error;
pub mod generator;
pub mod path;
pub mod publisher;
pub mod reconciler;
pub mod registry;
pub mod spec;
pub mod store;

pub use error::{CoreError, Result};
pub use generator::{Generator, GeneratorSettings};
pub use path::join_path;
pub use publisher::Publisher;
pub use reconciler::{CycleSummary, Reconciler, ServiceSource};
pub use registry::SpecIndex;
pub use spec::{host_label, Artifact, ServiceMetadata, ServicePort, Spec};
pub use store::{ArtifactStore, MemoryStore};
