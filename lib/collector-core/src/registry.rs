//! Spec index for eligible services, keyed by namespace then name

use crate::{CoreError, Result, Spec};
use std::collections::BTreeMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

type Entries = BTreeMap<String, BTreeMap<String, Spec>>;

/// SpecIndex holds the spec of every eligible service.
///
/// All access goes through [`SpecIndex::lock`]. The returned guard is held
/// across mutation, regeneration and publish so that nothing ever observes a
/// partially updated index.
pub struct SpecIndex {
    entries: Mutex<Entries>,
}

/// Exclusive access to the index contents
pub struct SpecIndexGuard<'a> {
    entries: MutexGuard<'a, Entries>,
}

impl SpecIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Acquire the exclusive index lock
    pub async fn lock(&self) -> SpecIndexGuard<'_> {
        SpecIndexGuard {
            entries: self.entries.lock().await,
        }
    }

    /// Get count of indexed specs
    pub async fn spec_count(&self) -> usize {
        self.lock().await.len()
    }
}

impl Default for SpecIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecIndexGuard<'_> {
    /// Insert or replace the spec for its `(namespace, name)`.
    ///
    /// Fails with [`CoreError::HostLabelConflict`] when another service
    /// already owns the same host label; the index is left untouched.
    pub fn upsert(&mut self, spec: Spec) -> Result<Option<Spec>> {
        let host = spec.host();
        if let Some(existing) = self.specs().find(|other| {
            other.host() == host && (other.namespace != spec.namespace || other.name != spec.name)
        }) {
            return Err(CoreError::HostLabelConflict {
                host,
                existing: existing.to_string(),
                incoming: spec.to_string(),
            });
        }

        debug!("Indexed spec: {}", spec);
        let previous = self
            .entries
            .entry(spec.namespace.clone())
            .or_default()
            .insert(spec.name.clone(), spec);
        Ok(previous)
    }

    /// Remove a spec, pruning the namespace once it holds no specs
    pub fn remove(&mut self, namespace: &str, name: &str) -> Option<Spec> {
        let specs = self.entries.get_mut(namespace)?;
        let removed = specs.remove(name);
        if specs.is_empty() {
            self.entries.remove(namespace);
        }
        if removed.is_some() {
            debug!("Removed spec: {}/{}", namespace, name);
        }
        removed
    }

    /// Get the spec of a service
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Spec> {
        self.entries.get(namespace)?.get(name)
    }

    /// Iterate over all specs in `(namespace, name)` order
    pub fn specs(&self) -> impl Iterator<Item = &Spec> {
        self.entries.values().flat_map(|specs| specs.values())
    }

    /// Clone the full contents for artifact generation
    pub fn snapshot(&self) -> Vec<Spec> {
        self.specs().cloned().collect()
    }

    /// Number of specs
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Check if the index holds no specs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if any spec lives in `namespace`
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.entries.contains_key(namespace)
    }

    /// Number of namespaces holding at least one spec
    pub fn namespace_count(&self) -> usize {
        self.entries.len()
    }
}
