//! Server-side apply of manifest objects

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, Patch, PatchParams};
use kube::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use super::manifest::{api_resource_of, display_meta, kind_of};
use super::ManifestObjects;
use crate::{Error, FIELD_MANAGER};

/// Applies a set of manifest objects to the cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManifestApplier: Send + Sync {
    /// Create or update every object, in manifest order
    async fn apply(&self, objects: &ManifestObjects) -> Result<(), Error>;
}

/// Applier backed by the Kubernetes API using server-side apply
pub struct KubeApplier {
    client: Client,
}

impl KubeApplier {
    /// Create a new KubeApplier wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ManifestApplier for KubeApplier {
    async fn apply(&self, objects: &ManifestObjects) -> Result<(), Error> {
        let params = PatchParams::apply(FIELD_MANAGER).force();

        for obj in &objects.items {
            let ar = api_resource_of(obj)?;
            let name = obj.metadata.name.as_deref().unwrap_or_default();

            let api: Api<DynamicObject> = match obj.metadata.namespace.as_deref() {
                Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
                None => Api::all_with(self.client.clone(), &ar),
            };

            api.patch(name, &params, &Patch::Apply(obj)).await?;

            debug!(
                kind = %kind_of(obj),
                object = %display_meta(&obj.metadata),
                "applied manifest object"
            );
        }

        Ok(())
    }
}
