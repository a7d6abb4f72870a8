//! Parsed manifest objects
//!
//! A manifest is a multi-document YAML file. Every document becomes one
//! [`DynamicObject`]; empty documents (stray `---` separators, comments) are
//! skipped.

use std::collections::BTreeMap;

use kube::api::{DynamicObject, GroupVersionKind};
use kube::core::ObjectMeta;
use kube::discovery::ApiResource;
use serde::Deserialize;

use crate::Error;

/// Kinds that are never namespaced and must keep an empty namespace
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "Namespace",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "MutatingWebhookConfiguration",
    "ValidatingWebhookConfiguration",
    "PriorityClass",
    "PersistentVolume",
    "StorageClass",
    "APIService",
];

/// The set of objects rendered for one add-on resource
#[derive(Clone, Debug, Default)]
pub struct ManifestObjects {
    /// Objects in manifest order
    pub items: Vec<DynamicObject>,
}

impl ManifestObjects {
    /// Parse a multi-document YAML manifest
    pub fn parse(manifest: &str) -> Result<Self, Error> {
        let mut items = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(manifest).enumerate() {
            let value = serde_json::Value::deserialize(document)
                .map_err(|e| Error::manifest(format!("document {index}: invalid YAML: {e}")))?;
            if value.is_null() {
                continue;
            }

            for field in ["/apiVersion", "/kind", "/metadata/name"] {
                if value.pointer(field).and_then(|v| v.as_str()).is_none() {
                    return Err(Error::manifest(format!(
                        "document {index}: missing {}",
                        field.trim_start_matches('/').replace('/', ".")
                    )));
                }
            }

            let obj: DynamicObject = serde_json::from_value(value)
                .map_err(|e| Error::serialization(format!("document {index}: {e}")))?;
            items.push(obj);
        }

        Ok(Self { items })
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move every namespaced object into `namespace`
    pub fn set_namespace(&mut self, namespace: &str) {
        for obj in self.items.iter_mut().filter(|o| !is_cluster_scoped(o)) {
            obj.metadata.namespace = Some(namespace.to_string());
        }
    }

    /// Add a label to every object
    pub fn add_label(&mut self, key: &str, value: &str) {
        for obj in &mut self.items {
            obj.metadata
                .labels
                .get_or_insert_with(BTreeMap::new)
                .insert(key.to_string(), value.to_string());
        }
    }
}

/// Kind of a manifest object, or an empty string if untyped
pub fn kind_of(obj: &DynamicObject) -> &str {
    obj.types.as_ref().map(|t| t.kind.as_str()).unwrap_or_default()
}

/// True if the object's kind is known to be cluster scoped
pub fn is_cluster_scoped(obj: &DynamicObject) -> bool {
    CLUSTER_SCOPED_KINDS.contains(&kind_of(obj))
}

/// Resolve the API resource of a manifest object from its apiVersion and kind
pub fn api_resource_of(obj: &DynamicObject) -> Result<ApiResource, Error> {
    let types = obj
        .types
        .as_ref()
        .ok_or_else(|| Error::manifest(format!("object {} has no type", display_meta(&obj.metadata))))?;

    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), types.api_version.clone()),
    };

    Ok(ApiResource::from_gvk(&GroupVersionKind {
        group,
        version,
        kind: types.kind.clone(),
    }))
}

/// `<namespace>/<name>` or `<name>` for cluster scoped objects
pub fn display_meta(meta: &ObjectMeta) -> String {
    let name = meta.name.as_deref().unwrap_or_default();
    match meta.namespace.as_deref() {
        Some(ns) => format!("{ns}/{name}"),
        None => name.to_string(),
    }
}
