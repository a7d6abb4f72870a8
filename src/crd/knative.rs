//! Knative Custom Resource Definitions
//!
//! `Knative` is the user-facing root resource. Installing it fans out into one
//! component resource per Knative subsystem, each living in its own namespace.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{addon_object, CommonSpec, CommonStatus};

/// Specification for the Knative add-on
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.sigs.k8s.io",
    version = "v1alpha1",
    kind = "Knative",
    plural = "knatives",
    status = "CommonStatus",
    namespaced,
    printcolumn = r#"{"name":"Healthy","type":"boolean","jsonPath":".status.healthy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct KnativeSpec {
    /// Version and channel of the manifest to install
    #[serde(flatten)]
    pub common: CommonSpec,
}

/// Specification for the Knative Build component
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.sigs.k8s.io",
    version = "v1alpha1",
    kind = "KnativeBuild",
    plural = "knativebuilds",
    status = "CommonStatus",
    namespaced,
    printcolumn = r#"{"name":"Healthy","type":"boolean","jsonPath":".status.healthy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct KnativeBuildSpec {
    /// Version and channel of the manifest to install
    #[serde(flatten)]
    pub common: CommonSpec,
}

/// Specification for the Knative Istio integration component
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.sigs.k8s.io",
    version = "v1alpha1",
    kind = "KnativeIstio",
    plural = "knativeistios",
    status = "CommonStatus",
    namespaced,
    printcolumn = r#"{"name":"Healthy","type":"boolean","jsonPath":".status.healthy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct KnativeIstioSpec {
    /// Version and channel of the manifest to install
    #[serde(flatten)]
    pub common: CommonSpec,
}

/// Specification for the Knative Monitoring component
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.sigs.k8s.io",
    version = "v1alpha1",
    kind = "KnativeMonitoring",
    plural = "knativemonitorings",
    status = "CommonStatus",
    namespaced,
    printcolumn = r#"{"name":"Healthy","type":"boolean","jsonPath":".status.healthy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct KnativeMonitoringSpec {
    /// Version and channel of the manifest to install
    #[serde(flatten)]
    pub common: CommonSpec,
}

/// Specification for the Knative Serving component
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "addons.sigs.k8s.io",
    version = "v1alpha1",
    kind = "KnativeServing",
    plural = "knativeservings",
    status = "CommonStatus",
    namespaced,
    printcolumn = r#"{"name":"Healthy","type":"boolean","jsonPath":".status.healthy"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct KnativeServingSpec {
    /// Version and channel of the manifest to install
    #[serde(flatten)]
    pub common: CommonSpec,
}

addon_object!(Knative, "knative");
addon_object!(KnativeBuild, "knativebuild");
addon_object!(KnativeIstio, "knativeistio");
addon_object!(KnativeMonitoring, "knativemonitoring");
addon_object!(KnativeServing, "knativeserving");
