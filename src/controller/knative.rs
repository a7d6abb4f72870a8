//! Knative controller wiring
//!
//! Plugs the preflight gate, the lifecycle hook and the status aggregator into
//! the declarative pipeline. The Knative manifest is applied with the
//! namespaces it was written with, since its components each live in their own
//! namespace.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::debug;

use super::client::AddonClient;
use super::lifecycle::LifecycleHook;
use super::preflight::{PreflightCondition, PreflightGate};
use super::registry::DependentRegistry;
use super::status::StatusAggregator;
use crate::crd::{AddonObject, Knative};
use crate::declarative::{
    DeclarativeReconciler, ManifestApplier, ManifestLoader, ManifestObjects, StatusHook,
};
use crate::{Error, KNATIVE_FINALIZER};

/// Settings for the Knative controller
#[derive(Clone, Debug)]
pub struct KnativeOptions {
    /// Deployment that must be Available before Knative is installed
    pub preflight: PreflightCondition,
    /// Component resources created by the Knative manifest
    pub registry: Arc<DependentRegistry>,
    /// Finalizer token owned by the controller
    pub finalizer: String,
}

impl Default for KnativeOptions {
    fn default() -> Self {
        Self {
            preflight: PreflightCondition::default(),
            registry: Arc::new(DependentRegistry::knative_default()),
            finalizer: KNATIVE_FINALIZER.to_string(),
        }
    }
}

/// Status hook combining the preflight gate and the health rollup
pub struct KnativeStatus {
    gate: PreflightGate,
    aggregator: StatusAggregator,
}

impl KnativeStatus {
    /// Create the status hook
    pub fn new(gate: PreflightGate, aggregator: StatusAggregator) -> Self {
        Self { gate, aggregator }
    }
}

#[async_trait]
impl<K: AddonObject> StatusHook<K> for KnativeStatus {
    async fn preflight(&self, root: &K) -> Result<(), Error> {
        self.gate.check(root).await
    }

    async fn reconciled(&self, root: &K, _objects: &ManifestObjects) -> Result<(), Error> {
        // The finalizer is gone by now; the root is about to disappear
        if root.is_deleting() {
            debug!(root = %root.name_any(), "root is deleting, skipping status");
            return Ok(());
        }
        self.aggregator.reconcile_status(root).await
    }
}

/// Build the reconciler for the Knative root resource
pub fn knative_reconciler(
    client: Arc<dyn AddonClient>,
    loader: Arc<dyn ManifestLoader>,
    applier: Arc<dyn ManifestApplier>,
    options: KnativeOptions,
) -> DeclarativeReconciler<Knative> {
    let lifecycle =
        LifecycleHook::new(client.clone(), options.registry.clone(), options.finalizer);
    let status = KnativeStatus::new(
        PreflightGate::new(client.clone(), options.preflight),
        StatusAggregator::new(client, options.registry),
    );

    DeclarativeReconciler::new(loader, applier)
        .preserve_namespace()
        .object_transform(Arc::new(lifecycle))
        .status(Arc::new(status))
}
