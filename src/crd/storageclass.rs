//! StorageClass add-on Custom Resource Definition
//!
//! Installs a storage provisioner and its `storage.k8s.io` StorageClass objects.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{addon_object, CommonSpec, CommonStatus};

/// Specification for the StorageClass add-on
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.sigs.k8s.io",
    version = "v1alpha1",
    kind = "StorageClass",
    plural = "storageclasses",
    status = "CommonStatus",
    namespaced,
    printcolumn = r#"{"name":"Healthy","type":"boolean","jsonPath":".status.healthy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct StorageClassSpec {
    /// Version and channel of the manifest to install
    #[serde(flatten)]
    pub common: CommonSpec,
}

addon_object!(StorageClass, "storageclass");
