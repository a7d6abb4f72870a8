//! Kubernetes API seam for the add-on controllers
//!
//! Everything the hooks read or write goes through [`AddonClient`] so the
//! reconciliation logic can be exercised against a mock.

use std::fmt;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::{Client, ResourceExt};

#[cfg(test)]
use mockall::automock;

use super::registry::DependentRef;
use crate::crd::{AddonObject, CommonStatus};
use crate::{Error, FIELD_MANAGER};

/// Identity of the add-on resource whose status and finalizers are written
#[derive(Clone, Debug)]
pub struct RootRef {
    /// API resource of the root's kind
    pub resource: ApiResource,
    /// Namespace of the root
    pub namespace: String,
    /// Name of the root
    pub name: String,
    /// resourceVersion observed when the pass started
    pub resource_version: Option<String>,
}

impl RootRef {
    /// Capture the identity of an add-on resource
    pub fn of<K: AddonObject>(obj: &K) -> Self {
        Self {
            resource: ApiResource::erase::<K>(&()),
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
            resource_version: obj.resource_version(),
        }
    }
}

impl fmt::Display for RootRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Trait abstracting Kubernetes client operations for the add-on hooks
///
/// This trait allows mocking the Kubernetes client in tests while using
/// the real client in production. Absent objects surface as
/// [`Error::NotFound`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AddonClient: Send + Sync {
    /// Fetch a dependent custom resource
    async fn get_object(&self, target: &DependentRef) -> Result<DynamicObject, Error>;

    /// Delete a dependent custom resource
    async fn delete_object(&self, target: &DependentRef) -> Result<(), Error>;

    /// Fetch a Deployment
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, Error>;

    /// Replace the status of an add-on resource
    async fn patch_status(&self, root: &RootRef, status: &CommonStatus) -> Result<(), Error>;

    /// Replace the finalizer list of an add-on resource
    ///
    /// The write is conditional on the resourceVersion captured in `root`.
    async fn patch_finalizers(&self, root: &RootRef, finalizers: Vec<String>) -> Result<(), Error>;
}

/// Real Kubernetes client implementation
pub struct KubeAddonClient {
    client: Client,
}

impl KubeAddonClient {
    /// Create a new KubeAddonClient wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Params for merge patches, attributed to the operator's field manager
    fn merge_params() -> PatchParams {
        PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PatchParams::default()
        }
    }

    fn dynamic_api(&self, namespace: &str, resource: &ApiResource) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, resource)
    }
}

#[async_trait]
impl AddonClient for KubeAddonClient {
    async fn get_object(&self, target: &DependentRef) -> Result<DynamicObject, Error> {
        self.dynamic_api(&target.namespace, &target.resource)
            .get(&target.name)
            .await
            .map_err(|e| Error::from_kube(e, target.to_string()))
    }

    async fn delete_object(&self, target: &DependentRef) -> Result<(), Error> {
        self.dynamic_api(&target.namespace, &target.resource)
            .delete(&target.name, &DeleteParams::default())
            .await
            .map_err(|e| Error::from_kube(e, target.to_string()))?;
        Ok(())
    }

    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, Error> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| Error::from_kube(e, format!("{namespace}/{name}")))
    }

    async fn patch_status(&self, root: &RootRef, status: &CommonStatus) -> Result<(), Error> {
        // Merge patch with the full error list so an empty list clears stale entries
        let status_patch = serde_json::json!({
            "status": {
                "healthy": status.healthy,
                "errors": status.errors,
            }
        });

        self.dynamic_api(&root.namespace, &root.resource)
            .patch_status(&root.name, &Self::merge_params(), &Patch::Merge(&status_patch))
            .await?;

        Ok(())
    }

    async fn patch_finalizers(&self, root: &RootRef, finalizers: Vec<String>) -> Result<(), Error> {
        let mut metadata = serde_json::json!({ "finalizers": finalizers });
        if let Some(rv) = &root.resource_version {
            metadata["resourceVersion"] = serde_json::Value::String(rv.clone());
        }
        let patch = serde_json::json!({ "metadata": metadata });

        self.dynamic_api(&root.namespace, &root.resource)
            .patch(&root.name, &Self::merge_params(), &Patch::Merge(&patch))
            .await?;

        Ok(())
    }
}
