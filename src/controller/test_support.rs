//! Shared fixtures for controller tests

use std::sync::{Arc, Mutex};

use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition, DeploymentStatus};
use kube::api::DynamicObject;

use super::client::MockAddonClient;
use super::registry::DependentRef;
use crate::crd::{CommonStatus, Knative};

/// A live Knative root without finalizers or status
pub fn knative() -> Knative {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "addons.sigs.k8s.io/v1alpha1",
        "kind": "Knative",
        "metadata": {
            "name": "knative",
            "namespace": "knative-system",
            "uid": "knative-uid",
            "resourceVersion": "1"
        },
        "spec": {}
    }))
    .expect("valid Knative")
}

/// A Knative root marked for deletion carrying `finalizers`
pub fn deleting_knative(finalizers: &[&str]) -> Knative {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "addons.sigs.k8s.io/v1alpha1",
        "kind": "Knative",
        "metadata": {
            "name": "knative",
            "namespace": "knative-system",
            "uid": "knative-uid",
            "resourceVersion": "7",
            "deletionTimestamp": "2024-01-01T00:00:00Z",
            "finalizers": finalizers
        },
        "spec": {}
    }))
    .expect("valid Knative")
}

/// The object a dependent reference points at, with an optional health flag
pub fn dependent_object(target: &DependentRef, healthy: Option<bool>) -> DynamicObject {
    let mut value = serde_json::json!({
        "apiVersion": target.resource.api_version,
        "kind": target.resource.kind,
        "metadata": { "name": target.name, "namespace": target.namespace },
        "spec": {}
    });
    if let Some(healthy) = healthy {
        value["status"] = serde_json::json!({ "healthy": healthy, "errors": [] });
    }
    serde_json::from_value(value).expect("valid dependent")
}

fn deployment_with_available(status: &str) -> Deployment {
    Deployment {
        status: Some(DeploymentStatus {
            conditions: Some(vec![DeploymentCondition {
                type_: "Available".to_string(),
                status: status.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A Deployment reporting `Available=True`
pub fn available_deployment() -> Deployment {
    deployment_with_available("True")
}

/// A Deployment reporting `Available=False`
pub fn unavailable_deployment() -> Deployment {
    deployment_with_available("False")
}

/// Captured status writes, for verifying what was written rather than how
#[derive(Clone, Default)]
pub struct StatusCapture {
    updates: Arc<Mutex<Vec<CommonStatus>>>,
}

impl StatusCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every `patch_status` call on `mock`
    pub fn expect_patch_status(&self, mock: &mut MockAddonClient) {
        let updates = self.updates.clone();
        mock.expect_patch_status().returning(move |_, status| {
            updates.lock().unwrap().push(status.clone());
            Ok(())
        });
    }

    pub fn last(&self) -> Option<CommonStatus> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

/// Captured finalizer writes
#[derive(Clone, Default)]
pub struct FinalizerCapture {
    updates: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FinalizerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every `patch_finalizers` call on `mock`
    pub fn expect_patch_finalizers(&self, mock: &mut MockAddonClient) {
        let updates = self.updates.clone();
        mock.expect_patch_finalizers()
            .returning(move |_, finalizers| {
                updates.lock().unwrap().push(finalizers);
                Ok(())
            });
    }

    pub fn last(&self) -> Option<Vec<String>> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}
