//! Finalizer management and cross-namespace teardown
//!
//! Dependents of the root live in other namespaces, so Kubernetes garbage
//! collection cannot remove them. The root carries a finalizer for as long as
//! it lives; on deletion every dependent is deleted before the finalizer is
//! released.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info, info_span, Instrument, Span};

use super::client::{AddonClient, RootRef};
use super::registry::DependentRegistry;
use crate::crd::AddonObject;
use crate::declarative::{ManifestObjects, ObjectTransform};
use crate::Error;

/// Delete every registered dependent, in registry order
///
/// Dependents that are already gone are skipped. The first other error aborts
/// the teardown; calling this again restarts it from the top.
pub async fn delete_dependents(
    client: &dyn AddonClient,
    registry: &DependentRegistry,
) -> Result<(), Error> {
    for target in registry.iter() {
        match client.get_object(target).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                debug!(dependent = %target, "dependent already gone");
                continue;
            }
            Err(e) => return Err(e),
        }

        match client.delete_object(target).await {
            Ok(()) => info!(dependent = %target, kind = %target.kind(), "deleted dependent"),
            Err(e) if e.is_not_found() => {
                debug!(dependent = %target, "dependent vanished before delete")
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

/// Object transform that owns the root's finalizer
pub struct LifecycleHook {
    client: Arc<dyn AddonClient>,
    registry: Arc<DependentRegistry>,
    finalizer: String,
    span: Span,
}

impl LifecycleHook {
    /// Create a hook managing `finalizer` for the dependents in `registry`
    pub fn new(
        client: Arc<dyn AddonClient>,
        registry: Arc<DependentRegistry>,
        finalizer: impl Into<String>,
    ) -> Self {
        let finalizer = finalizer.into();
        let span = info_span!("lifecycle", finalizer = %finalizer);
        Self {
            client,
            registry,
            finalizer,
            span,
        }
    }

    async fn finalize<K: AddonObject>(
        &self,
        root: &K,
        objects: &mut ManifestObjects,
    ) -> Result<(), Error> {
        delete_dependents(&*self.client, &self.registry).await?;

        if root.has_finalizer(&self.finalizer) {
            let remaining: Vec<String> = root
                .finalizers()
                .iter()
                .filter(|f| **f != self.finalizer)
                .cloned()
                .collect();
            self.client.patch_finalizers(&RootRef::of(root), remaining).await?;
            info!(root = %root.name_any(), "dependents deleted, removed finalizer");
        }

        // Nothing may be recreated while the root is going away
        objects.items.clear();
        Ok(())
    }

    async fn ensure_finalizer<K: AddonObject>(&self, root: &K) -> Result<(), Error> {
        if root.has_finalizer(&self.finalizer) {
            return Ok(());
        }

        let mut finalizers = root.finalizers().to_vec();
        finalizers.push(self.finalizer.clone());
        self.client.patch_finalizers(&RootRef::of(root), finalizers).await?;
        info!(root = %root.name_any(), "added finalizer");
        Ok(())
    }
}

#[async_trait]
impl<K: AddonObject> ObjectTransform<K> for LifecycleHook {
    async fn transform(&self, root: &K, objects: &mut ManifestObjects) -> Result<(), Error> {
        if root.is_deleting() {
            self.finalize(root, objects).instrument(self.span.clone()).await
        } else {
            self.ensure_finalizer(root).instrument(self.span.clone()).await
        }
    }
}
