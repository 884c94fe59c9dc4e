//! Routing records and the service metadata they are derived from

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized routing record for one eligible service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Spec {
    pub name: String,
    pub namespace: String,
    pub port: u16,
    /// Route prefix under which the service serves its API document
    pub path: String,
}

impl Spec {
    /// Create a spec
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            port,
            path: path.into(),
        }
    }

    /// Routing identifier used as upstream name and path segment
    pub fn host(&self) -> String {
        host_label(&self.name, &self.namespace)
    }

    /// Authority of the backing service, `name.namespace:port`
    pub fn authority(&self) -> String {
        format!("{}.{}:{}", self.name, self.namespace, self.port)
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Derive the host label for a service
pub fn host_label(name: &str, namespace: &str) -> String {
    format!("{}-{}", name, namespace)
}

/// A port declared on a service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePort {
    pub name: Option<String>,
    pub port: i32,
}

/// The subset of a cluster service the collector looks at
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

impl ServiceMetadata {
    /// Create metadata with no annotations or ports
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Add an annotation
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Declare a port
    pub fn with_port(mut self, name: Option<&str>, port: i32) -> Self {
        self.ports.push(ServicePort {
            name: name.map(str::to_string),
            port,
        });
        self
    }

    /// Get an annotation value
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

impl fmt::Display for ServiceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A named multi-file object published for downstream consumers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub data: BTreeMap<String, String>,
}

impl Artifact {
    /// Create an empty artifact
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: BTreeMap::new(),
        }
    }

    /// Get the contents of one file
    pub fn file(&self, filename: &str) -> Option<&str> {
        self.data.get(filename).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_label_is_deterministic() {
        assert_eq!(host_label("svc-1", "ns-1"), "svc-1-ns-1");
        assert_eq!(host_label("svc-1", "ns-1"), host_label("svc-1", "ns-1"));
    }

    #[test]
    fn test_spec_host_and_authority() {
        let spec = Spec::new("svc-1", "ns-1", 8000, "/v1");
        assert_eq!(spec.host(), "svc-1-ns-1");
        assert_eq!(spec.authority(), "svc-1.ns-1:8000");
        assert_eq!(spec.to_string(), "ns-1/svc-1");
    }

    #[test]
    fn test_service_metadata_builder() {
        let svc = ServiceMetadata::new("svc", "ns")
            .with_annotation("openapi/collect", "true")
            .with_port(Some("http"), 8080);
        assert_eq!(svc.annotation("openapi/collect"), Some("true"));
        assert_eq!(svc.annotation("openapi/path"), None);
        assert_eq!(svc.ports.len(), 1);
        assert_eq!(svc.to_string(), "ns/svc");
    }
}
