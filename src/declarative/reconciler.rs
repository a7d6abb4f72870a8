//! The declarative reconciliation pipeline
//!
//! One pass over an add-on resource runs, in order:
//!
//! 1. the status hook's preflight check
//! 2. manifest load for the resource's component and version
//! 3. namespace handling, source labels and owner references
//! 4. the object transform (which may rewrite or clear the manifest)
//! 5. server-side apply
//! 6. the status hook's post-apply update
//!
//! Any error aborts the pass; the controller's error policy requeues.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::debug;

use super::{ManifestApplier, ManifestLoader, ManifestObjects};
use crate::crd::AddonObject;
use crate::{source_label_key, Error, REQUEUE_SUCCESS_SECS};

/// Rewrites the manifest objects of a resource before they are applied
#[async_trait]
pub trait ObjectTransform<K: AddonObject>: Send + Sync {
    /// Transform `objects` rendered for `obj` in place
    async fn transform(&self, obj: &K, objects: &mut ManifestObjects) -> Result<(), Error>;
}

/// Observes and reports the health of a resource around apply
#[async_trait]
pub trait StatusHook<K: AddonObject>: Send + Sync {
    /// Gate the pass before anything is loaded or applied
    async fn preflight(&self, _obj: &K) -> Result<(), Error> {
        Ok(())
    }

    /// Update the resource's status after `objects` were applied
    async fn reconciled(&self, obj: &K, objects: &ManifestObjects) -> Result<(), Error>;
}

/// Which owner references applied objects receive
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OwnerStrategy {
    /// Applied objects are not owned
    #[default]
    None,
    /// Objects in the resource's own namespace are owned by the resource
    SourceAsOwner,
}

/// Reconciles an add-on resource by applying its manifest
pub struct DeclarativeReconciler<K: AddonObject> {
    loader: Arc<dyn ManifestLoader>,
    applier: Arc<dyn ManifestApplier>,
    preserve_namespace: bool,
    owner: OwnerStrategy,
    source_labels: bool,
    transform: Option<Arc<dyn ObjectTransform<K>>>,
    status: Option<Arc<dyn StatusHook<K>>>,
}

impl<K: AddonObject> DeclarativeReconciler<K> {
    /// Create a reconciler with default options
    ///
    /// By default namespaced objects are moved into the resource's namespace,
    /// objects are neither labelled nor owned, and there are no hooks.
    pub fn new(loader: Arc<dyn ManifestLoader>, applier: Arc<dyn ManifestApplier>) -> Self {
        Self {
            loader,
            applier,
            preserve_namespace: false,
            owner: OwnerStrategy::None,
            source_labels: false,
            transform: None,
            status: None,
        }
    }

    /// Keep the namespaces written in the manifest
    pub fn preserve_namespace(mut self) -> Self {
        self.preserve_namespace = true;
        self
    }

    /// Set the owner reference strategy
    pub fn owner(mut self, owner: OwnerStrategy) -> Self {
        self.owner = owner;
        self
    }

    /// Label every object with `addons.sigs.k8s.io/<component>=<name>`
    pub fn source_labels(mut self) -> Self {
        self.source_labels = true;
        self
    }

    /// Install an object transform
    pub fn object_transform(mut self, transform: Arc<dyn ObjectTransform<K>>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Install a status hook
    pub fn status(mut self, status: Arc<dyn StatusHook<K>>) -> Self {
        self.status = Some(status);
        self
    }

    /// Run one reconciliation pass for `obj`
    pub async fn reconcile(&self, obj: &K) -> Result<Action, Error> {
        if let Some(status) = &self.status {
            status.preflight(obj).await?;
        }

        let mut objects = self
            .loader
            .load(K::component_name(), obj.common_spec())
            .await?;
        debug!(count = objects.len(), "loaded manifest");

        self.prepare(obj, &mut objects);

        if let Some(transform) = &self.transform {
            transform.transform(obj, &mut objects).await?;
        }

        self.applier.apply(&objects).await?;

        if let Some(status) = &self.status {
            status.reconciled(obj, &objects).await?;
        }

        if obj.is_deleting() {
            Ok(Action::await_change())
        } else {
            Ok(Action::requeue(Duration::from_secs(REQUEUE_SUCCESS_SECS)))
        }
    }

    /// Apply namespace, label and ownership options to freshly loaded objects
    fn prepare(&self, obj: &K, objects: &mut ManifestObjects) {
        let namespace = obj.namespace();

        if !self.preserve_namespace {
            if let Some(ns) = namespace.as_deref() {
                objects.set_namespace(ns);
            }
        }

        if self.source_labels {
            objects.add_label(&source_label_key(K::component_name()), &obj.name_any());
        }

        if self.owner == OwnerStrategy::SourceAsOwner {
            // Namespaced owners can only own objects in their own namespace
            let Some(owner_ref) = obj.controller_owner_ref(&()) else {
                return;
            };
            for item in &mut objects.items {
                if namespace.is_none() || item.metadata.namespace != namespace {
                    continue;
                }
                let refs = item.metadata.owner_references.get_or_insert_with(Vec::new);
                if !refs.iter().any(|r| r.uid == owner_ref.uid) {
                    refs.push(owner_ref.clone());
                }
            }
        }
    }
}
