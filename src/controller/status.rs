//! Composite health of the root resource
//!
//! After every successful apply the root's status is recomputed from scratch
//! out of its dependents' statuses. Writes are suppressed when nothing changed.

use std::sync::Arc;

use kube::ResourceExt;
use tracing::{debug, info, info_span, warn, Instrument, Span};

use super::client::{AddonClient, RootRef};
use super::registry::DependentRegistry;
use crate::crd::{status_equal, AddonObject, CommonStatus};
use crate::Error;

/// Write `status` onto `root` unless it equals the stored status
///
/// Returns true if a write happened.
pub(crate) async fn persist_status<K: AddonObject>(
    client: &dyn AddonClient,
    root: &K,
    status: CommonStatus,
) -> Result<bool, Error> {
    if status_equal(&status, &root.common_status()) {
        debug!(root = %root.name_any(), "status unchanged, skipping update");
        return Ok(false);
    }

    let target = RootRef::of(root);
    if let Err(e) = client.patch_status(&target, &status).await {
        warn!(root = %target, error = %e, "failed to update status");
        return Err(e);
    }

    info!(
        root = %target,
        healthy = status.healthy,
        errors = status.errors.len(),
        "updated status"
    );
    Ok(true)
}

/// Rolls the health of the registered dependents up into one status
pub struct StatusAggregator {
    client: Arc<dyn AddonClient>,
    registry: Arc<DependentRegistry>,
    span: Span,
}

impl StatusAggregator {
    /// Create an aggregator over `registry`
    pub fn new(client: Arc<dyn AddonClient>, registry: Arc<DependentRegistry>) -> Self {
        let span = info_span!("status_aggregator", dependents = registry.len());
        Self {
            client,
            registry,
            span,
        }
    }

    /// Compute the composite status from the dependents, in registry order
    ///
    /// A dependent that cannot be fetched is reported and skipped. A fetched
    /// object of the wrong kind is a hard error.
    pub async fn aggregate(&self) -> Result<CommonStatus, Error> {
        async {
            let mut errors = Vec::new();

            for target in self.registry.iter() {
                let obj = match self.client.get_object(target).await {
                    Ok(obj) => obj,
                    Err(e) => {
                        debug!(dependent = %target, error = %e, "dependent not readable");
                        errors.push(format!("can not find {}", target));
                        continue;
                    }
                };

                let status = CommonStatus::from_dynamic(&obj, target.kind())?;
                if !status.healthy {
                    errors.push(format!("{} is not healthy", target));
                }
            }

            Ok::<_, Error>(CommonStatus::from_errors(errors))
        }
        .instrument(self.span.clone())
        .await
    }

    /// Recompute the root's status and persist it if it changed
    pub async fn reconcile_status<K: AddonObject>(&self, root: &K) -> Result<(), Error> {
        let status = self.aggregate().await?;
        persist_status(&*self.client, root, status)
            .instrument(self.span.clone())
            .await?;
        Ok(())
    }
}
