//! Preflight gate
//!
//! Knative needs the Istio control plane. Until the gating Deployment exists
//! and reports `Available=True`, nothing is loaded or applied and the root's
//! status says why.

use std::fmt;
use std::sync::Arc;

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;
use tracing::{debug, info_span, warn, Instrument, Span};

use super::client::AddonClient;
use super::status::persist_status;
use crate::crd::{AddonObject, CommonStatus};
use crate::{
    Error, CONDITION_AVAILABLE, DEFAULT_PREFLIGHT_DEPLOYMENT, DEFAULT_PREFLIGHT_NAMESPACE,
    STATUS_TRUE,
};

/// A Deployment that must carry a condition before reconciliation proceeds
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreflightCondition {
    /// Namespace of the Deployment
    pub namespace: String,
    /// Name of the Deployment
    pub name: String,
    /// Condition type that must be `True`
    pub condition: String,
}

impl PreflightCondition {
    /// Require `namespace/name` to be `Available`
    pub fn available(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            condition: CONDITION_AVAILABLE.to_string(),
        }
    }
}

impl Default for PreflightCondition {
    fn default() -> Self {
        Self::available(DEFAULT_PREFLIGHT_NAMESPACE, DEFAULT_PREFLIGHT_DEPLOYMENT)
    }
}

impl fmt::Display for PreflightCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// True if the Deployment reports `condition_type=True`
pub fn deployment_has_condition(deployment: &Deployment, condition_type: &str) -> bool {
    deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .any(|c| c.type_ == condition_type && c.status == STATUS_TRUE)
        })
        .unwrap_or(false)
}

/// Checks the preflight condition for a root resource
pub struct PreflightGate {
    client: Arc<dyn AddonClient>,
    condition: PreflightCondition,
    span: Span,
}

impl PreflightGate {
    /// Create a gate on `condition`
    pub fn new(client: Arc<dyn AddonClient>, condition: PreflightCondition) -> Self {
        let span = info_span!("preflight", deployment = %condition);
        Self {
            client,
            condition,
            span,
        }
    }

    /// Check the condition, recording an unhealthy status on `root` when it is unmet
    ///
    /// A root that is being deleted always passes, without any lookup.
    pub async fn check<K: AddonObject>(&self, root: &K) -> Result<(), Error> {
        self.evaluate(root).instrument(self.span.clone()).await
    }

    async fn evaluate<K: AddonObject>(&self, root: &K) -> Result<(), Error> {
        if root.is_deleting() {
            debug!(root = %root.name_any(), "root is deleting, skipping preflight");
            return Ok(());
        }

        let lookup = self
            .client
            .get_deployment(&self.condition.namespace, &self.condition.name)
            .await;

        let (message, err) = match lookup {
            Ok(deployment) if deployment_has_condition(&deployment, &self.condition.condition) => {
                return Ok(());
            }
            Ok(_) => {
                let message = format!(
                    "deployment ({}) does not meet condition: {}",
                    self.condition, self.condition.condition
                );
                (message.clone(), Error::preflight(message))
            }
            Err(e) if e.is_not_found() => {
                let message = format!("{} not found", self.condition);
                (message.clone(), Error::preflight(message))
            }
            Err(e) => (format!("fetching {}: {}", self.condition.name, e), e),
        };

        warn!(root = %root.name_any(), error = %message, "preflight check failed");
        persist_status(&*self.client, root, CommonStatus::unhealthy(message)).await?;
        Err(err)
    }
}
