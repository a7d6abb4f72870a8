//! Controllers for the add-on resources
//!
//! Every add-on is reconciled by a [`DeclarativeReconciler`]; the Knative
//! controller adds its own hooks on top:
//!
//! - [`preflight`] gates installation on the Istio control plane
//! - [`lifecycle`] owns the finalizer and tears down cross-namespace dependents
//! - [`status`] rolls the dependents' health up onto the root
//! - [`router`] maps dependent and Deployment events back to the root

pub mod client;
pub mod knative;
pub mod lifecycle;
pub mod passthrough;
pub mod preflight;
pub mod registry;
pub mod router;
pub mod runner;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::{error, info, instrument, warn};

use crate::crd::AddonObject;
use crate::declarative::DeclarativeReconciler;
use crate::{Error, REQUEUE_ERROR_SECS, REQUEUE_PREFLIGHT_SECS};

pub use client::{AddonClient, KubeAddonClient, RootRef};
pub use knative::{knative_reconciler, KnativeOptions, KnativeStatus};
pub use lifecycle::{delete_dependents, LifecycleHook};
pub use passthrough::{component_reconciler, storageclass_reconciler, BasicStatus};
pub use preflight::{PreflightCondition, PreflightGate};
pub use registry::{DependentRef, DependentRegistry};
pub use router::{presence_changes, DeploymentPresence, EventRouter};
pub use status::StatusAggregator;

/// Reconcile an add-on resource
///
/// This is the main reconciliation function called by the controller runtime.
/// One call runs one full declarative pass.
#[instrument(
    skip(obj, ctx),
    fields(kind = %K::kind(&()), name = %obj.name_any(), namespace = ?obj.namespace())
)]
pub async fn reconcile<K: AddonObject>(
    obj: Arc<K>,
    ctx: Arc<DeclarativeReconciler<K>>,
) -> Result<Action, Error> {
    info!("reconciling add-on");
    ctx.reconcile(&obj).await
}

/// Error policy for the controller
///
/// An unmet preflight is polled more often than other failures.
pub fn error_policy<K: AddonObject>(
    obj: Arc<K>,
    error: &Error,
    _ctx: Arc<DeclarativeReconciler<K>>,
) -> Action {
    match error {
        Error::PreflightUnmet(reason) => {
            warn!(name = %obj.name_any(), %reason, "waiting for preflight");
            Action::requeue(Duration::from_secs(REQUEUE_PREFLIGHT_SECS))
        }
        _ => {
            error!(
                ?error,
                name = %obj.name_any(),
                retryable = error.is_retryable(),
                "reconciliation failed"
            );
            Action::requeue(Duration::from_secs(REQUEUE_ERROR_SECS))
        }
    }
}
