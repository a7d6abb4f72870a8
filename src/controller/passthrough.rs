//! Pass-through controllers for the component add-ons
//!
//! These resources carry no logic of their own: their manifest is applied as
//! is, and the component resources additionally report whether the
//! Deployments they installed are Available.

use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info_span, Instrument, Span};

use super::client::AddonClient;
use super::preflight::deployment_has_condition;
use super::status::persist_status;
use crate::crd::{AddonObject, CommonStatus, StorageClass};
use crate::declarative::manifest::{display_meta, kind_of};
use crate::declarative::{
    DeclarativeReconciler, ManifestApplier, ManifestLoader, ManifestObjects, OwnerStrategy,
    StatusHook,
};
use crate::{Error, CONDITION_AVAILABLE};

/// Status hook reporting on the Deployments of the applied manifest
pub struct BasicStatus {
    client: Arc<dyn AddonClient>,
    span: Span,
}

impl BasicStatus {
    /// Create the hook
    pub fn new(client: Arc<dyn AddonClient>) -> Self {
        Self {
            client,
            span: info_span!("basic_status"),
        }
    }

    /// Check every Deployment in `objects`, in manifest order
    pub async fn deployment_errors(&self, objects: &ManifestObjects) -> Vec<String> {
        let mut errors = Vec::new();

        for obj in objects.items.iter().filter(|o| kind_of(o) == "Deployment") {
            let target = display_meta(&obj.metadata);
            let namespace = obj.namespace().unwrap_or_default();

            match self.client.get_deployment(&namespace, &obj.name_any()).await {
                Ok(d) if deployment_has_condition(&d, CONDITION_AVAILABLE) => {}
                Ok(_) => errors.push(format!(
                    "deployment ({}) does not meet condition: {}",
                    target, CONDITION_AVAILABLE
                )),
                Err(e) => {
                    debug!(deployment = %target, error = %e, "deployment not readable");
                    errors.push(format!("can not find {}", target));
                }
            }
        }

        errors
    }
}

#[async_trait]
impl<K: AddonObject> StatusHook<K> for BasicStatus {
    async fn reconciled(&self, obj: &K, objects: &ManifestObjects) -> Result<(), Error> {
        if obj.is_deleting() {
            return Ok(());
        }

        async {
            let status = CommonStatus::from_errors(self.deployment_errors(objects).await);
            persist_status(&*self.client, obj, status).await?;
            Ok::<_, Error>(())
        }
        .instrument(self.span.clone())
        .await
    }
}

/// Build the reconciler for a Knative component resource
pub fn component_reconciler<K: AddonObject>(
    client: Arc<dyn AddonClient>,
    loader: Arc<dyn ManifestLoader>,
    applier: Arc<dyn ManifestApplier>,
) -> DeclarativeReconciler<K> {
    DeclarativeReconciler::new(loader, applier)
        .owner(OwnerStrategy::SourceAsOwner)
        .source_labels()
        .status(Arc::new(BasicStatus::new(client)))
}

/// Build the reconciler for the StorageClass add-on
pub fn storageclass_reconciler(
    loader: Arc<dyn ManifestLoader>,
    applier: Arc<dyn ManifestApplier>,
) -> DeclarativeReconciler<StorageClass> {
    DeclarativeReconciler::new(loader, applier)
}
