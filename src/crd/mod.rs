//! Custom Resource Definitions for the add-on operators
//!
//! This module contains all CRD definitions served under `addons.sigs.k8s.io`.

mod knative;
mod storageclass;
mod types;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

pub use knative::{
    Knative, KnativeBuild, KnativeBuildSpec, KnativeIstio, KnativeIstioSpec, KnativeMonitoring,
    KnativeMonitoringSpec, KnativeServing, KnativeServingSpec, KnativeSpec,
};
pub use storageclass::{StorageClass, StorageClassSpec};
pub use types::{status_equal, AddonObject, CommonSpec, CommonStatus};

/// All CRDs served by the operators, in installation order
pub fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        Knative::crd(),
        KnativeBuild::crd(),
        KnativeIstio::crd(),
        KnativeMonitoring::crd(),
        KnativeServing::crd(),
        StorageClass::crd(),
    ]
}
