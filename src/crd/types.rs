//! Supporting types shared by every add-on CRD

use std::fmt::Debug;

use kube::api::DynamicObject;
use kube::{Resource, ResourceExt};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Desired-state fields common to every add-on
///
/// Opaque to the reconciliation core; only the manifest loader reads it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommonSpec {
    /// Pinned manifest version. When unset the latest version of `channel` is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Release channel to resolve the version from (defaults to `stable`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Observed health shared by every add-on
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommonStatus {
    /// True when the add-on and everything it depends on is healthy
    #[serde(default)]
    pub healthy: bool,

    /// Human-readable problems, in the order they were found
    #[serde(default)]
    pub errors: Vec<String>,
}

impl CommonStatus {
    /// Build a status from a list of problems; healthy iff the list is empty
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            healthy: errors.is_empty(),
            errors,
        }
    }

    /// Build an unhealthy status carrying a single problem
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            errors: vec![error.into()],
        }
    }

    /// Read the common status of a dynamically fetched add-on resource
    ///
    /// The object must be of `expected_kind`. A missing or unparsable status
    /// reads as the default (unhealthy, no errors).
    pub fn from_dynamic(obj: &DynamicObject, expected_kind: &str) -> Result<Self, Error> {
        let found = obj
            .types
            .as_ref()
            .map(|t| t.kind.as_str())
            .unwrap_or_default();
        if found != expected_kind {
            return Err(Error::unexpected_kind(expected_kind, found));
        }

        Ok(obj
            .data
            .get("status")
            .cloned()
            .and_then(|s| serde_json::from_value(s).ok())
            .unwrap_or_default())
    }
}

/// Structural equality used to suppress redundant status writes
///
/// Compares every field; the error list is compared in order, so the same
/// problems reported in a different order count as a change.
pub fn status_equal(a: &CommonStatus, b: &CommonStatus) -> bool {
    a.healthy == b.healthy && a.errors == b.errors
}

/// Capability shared by every add-on custom resource
///
/// Controllers and hooks are generic over this trait instead of a concrete
/// resource type. Finalizers are read and written through
/// [`kube::ResourceExt`].
pub trait AddonObject:
    Resource<DynamicType = ()>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// Name of the add-on component, used for manifest lookup and labels
    fn component_name() -> &'static str;

    /// Desired state shared by all add-ons
    fn common_spec(&self) -> &CommonSpec;

    /// Current status, defaulted when the resource has none yet
    fn common_status(&self) -> CommonStatus;

    /// Replace the status
    fn set_common_status(&mut self, status: CommonStatus);

    /// True once the API server has marked the resource for deletion
    fn is_deleting(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }

    /// True if the finalizer token is registered on the resource
    fn has_finalizer(&self, token: &str) -> bool {
        self.finalizers().iter().any(|f| f == token)
    }
}

/// Implements [`AddonObject`] for a CRD whose spec and status flatten the common types
macro_rules! addon_object {
    ($kind:ty, $component:literal) => {
        impl $crate::crd::AddonObject for $kind {
            fn component_name() -> &'static str {
                $component
            }

            fn common_spec(&self) -> &$crate::crd::CommonSpec {
                &self.spec.common
            }

            fn common_status(&self) -> $crate::crd::CommonStatus {
                self.status.clone().unwrap_or_default()
            }

            fn set_common_status(&mut self, status: $crate::crd::CommonStatus) {
                self.status = Some(status);
            }
        }
    };
}

pub(crate) use addon_object;
