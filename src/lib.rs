//! Addon operators - CRD-driven Kubernetes operators for cluster add-ons
//!
//! Each add-on (Knative and its components, a StorageClass provisioner) is
//! described by a custom resource in the `addons.sigs.k8s.io` group. A
//! controller renders the add-on's static manifest, applies it, and reports a
//! composite health status back onto the resource.
//!
//! # Architecture
//!
//! - A thin declarative engine loads and applies manifests, exposing a
//!   preflight gate, a pre-apply object transform and a post-apply status hook
//! - The Knative controller plugs into those hooks to gate installation on the
//!   Istio control plane, manage its finalizer, tear down dependent resources
//!   that live in other namespaces, and roll their health up into one status
//! - Component controllers (KnativeServing, StorageClass, ...) are plain
//!   pass-through reconcilers
//!
//! # Modules
//!
//! - [`crd`] - Custom Resource Definitions and the [`crd::AddonObject`] capability
//! - [`declarative`] - Manifest loading, object transforms and server-side apply
//! - [`controller`] - Reconciliation logic for the add-on resources
//! - [`error`] - Error types for the operators

#![deny(missing_docs)]

pub mod controller;
pub mod crd;
pub mod declarative;
pub mod error;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// API group for all add-on custom resources
pub const ADDONS_GROUP: &str = "addons.sigs.k8s.io";

/// Finalizer token owned by the Knative controller
///
/// Other controllers' finalizers on the same resource are never touched.
pub const KNATIVE_FINALIZER: &str = "operator.knative.sig.addons.k8s.io";

/// Field manager used for server-side apply, status and finalizer patches
pub const FIELD_MANAGER: &str = "addon-operators";

/// Requeue interval after a successful reconciliation
pub const REQUEUE_SUCCESS_SECS: u64 = 300;

/// Requeue interval after a failed reconciliation
pub const REQUEUE_ERROR_SECS: u64 = 60;

/// Requeue interval while the preflight dependency is missing or unavailable
pub const REQUEUE_PREFLIGHT_SECS: u64 = 15;

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
pub const WATCH_TIMEOUT_SECS: u32 = 25;

/// Namespace of the deployment that gates Knative installation
pub const DEFAULT_PREFLIGHT_NAMESPACE: &str = "istio-system";

/// Name of the deployment that gates Knative installation
pub const DEFAULT_PREFLIGHT_DEPLOYMENT: &str = "istio-pilot";

/// Default name of the singleton Knative resource
pub const DEFAULT_ROOT_NAME: &str = "knative";

/// Default namespace of the singleton Knative resource
pub const DEFAULT_ROOT_NAMESPACE: &str = "knative-system";

/// Default directory containing add-on manifest channels
pub const DEFAULT_MANIFEST_DIR: &str = "/channels";

/// Channel consulted when a resource does not pin a version
pub const DEFAULT_CHANNEL: &str = "stable";

/// The "Available" condition type for deployments
pub const CONDITION_AVAILABLE: &str = "Available";

/// The "True" status value for conditions
pub const STATUS_TRUE: &str = "True";

/// Source label key for objects applied on behalf of a component
///
/// The full key is `addons.sigs.k8s.io/<component>` and the value is the name
/// of the resource the object was rendered from.
pub fn source_label_key(component: &str) -> String {
    format!("{}/{}", ADDONS_GROUP, component)
}
