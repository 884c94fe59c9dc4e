//! Periodic reconciliation of the spec index against the cluster
//!
//! Every cycle lists all services, rebuilds the index from the listing and
//! republishes both artifacts unconditionally. Index mutation, generation and
//! publish happen under one hold of the index lock.

use crate::annotations::{extract_spec, Extraction};
use crate::{ArtifactStore, CoreError, Generator, Publisher, Result, ServiceMetadata, SpecIndex};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Source of the services considered for collection
#[async_trait::async_trait]
pub trait ServiceSource: Send + Sync {
    async fn list_services(&self) -> Result<Vec<ServiceMetadata>>;
}

/// Outcome of a single reconciliation cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Services returned by the listing
    pub listed: usize,
    /// Specs in the index after the cycle
    pub collected: usize,
    /// Eligible services left out of the index
    pub skipped: usize,
    /// Specs dropped since the previous cycle
    pub removed: usize,
}

pub struct Reconciler<S, A> {
    source: S,
    publisher: Publisher<A>,
    generator: Generator,
    index: Arc<SpecIndex>,
}

impl<S: ServiceSource, A: ArtifactStore> Reconciler<S, A> {
    /// Create a reconciler over a shared index
    pub fn new(source: S, publisher: Publisher<A>, generator: Generator, index: Arc<SpecIndex>) -> Self {
        Self {
            source,
            publisher,
            generator,
            index,
        }
    }

    /// Get the spec index
    pub fn index(&self) -> &Arc<SpecIndex> {
        &self.index
    }

    /// Get the artifact publisher
    pub fn publisher(&self) -> &Publisher<A> {
        &self.publisher
    }

    /// Run one full cycle: list, rebuild the index, generate and publish
    pub async fn reconcile(&self) -> Result<CycleSummary> {
        let mut services = self.source.list_services().await?;
        services.sort_by(|a, b| {
            a.namespace
                .cmp(&b.namespace)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut summary = CycleSummary {
            listed: services.len(),
            ..Default::default()
        };

        let mut specs = Vec::new();
        for svc in &services {
            match extract_spec(svc) {
                Extraction::Ineligible => {}
                Extraction::Collected(spec) => {
                    info!("Collecting {}", svc);
                    specs.push(spec);
                }
                Extraction::UnresolvedPort(reference) => {
                    warn!("Cannot resolve port {:?} for service {}", reference, svc);
                    summary.skipped += 1;
                }
            }
        }

        let mut index = self.index.lock().await;

        let stale: Vec<(String, String)> = {
            let current: BTreeSet<(&str, &str)> = specs
                .iter()
                .map(|spec| (spec.namespace.as_str(), spec.name.as_str()))
                .collect();
            index
                .specs()
                .filter(|spec| !current.contains(&(spec.namespace.as_str(), spec.name.as_str())))
                .map(|spec| (spec.namespace.clone(), spec.name.clone()))
                .collect()
        };
        for (namespace, name) in stale {
            if index.remove(&namespace, &name).is_some() {
                info!("Dropping {}/{}", namespace, name);
                summary.removed += 1;
            }
        }

        for spec in specs {
            match index.upsert(spec) {
                Ok(_) => {}
                Err(CoreError::HostLabelConflict {
                    host,
                    existing,
                    incoming,
                }) => {
                    warn!(
                        "Skipping {}: host label {} is already used by {}",
                        incoming, host, existing
                    );
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        summary.collected = index.len();

        let artifacts = self.generator.generate(&index.snapshot())?;
        self.publisher.publish(&artifacts).await?;

        Ok(summary)
    }

    /// Reconcile every `interval` until `shutdown` flips to true.
    ///
    /// A failed cycle is logged and abandoned. Shutdown is honoured right
    /// before and during the wait between cycles, never mid-cycle.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Starting reconciliation every {:?}", interval);

        loop {
            match self.reconcile().await {
                Ok(summary) => info!(
                    "Reconciled {} services: {} collected, {} skipped, {} removed",
                    summary.listed, summary.collected, summary.skipped, summary.removed
                ),
                Err(e) => error!("Failed to collect specs: {}", e),
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            if *shutdown.borrow() {
                break;
            }
        }

        debug!("Reconciliation loop stopped");
    }
}
