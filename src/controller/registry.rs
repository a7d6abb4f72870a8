//! Dependent-resource registry
//!
//! The root Knative resource fans out into component resources that live in
//! other namespaces. The registry names each of them, in the order they are
//! torn down and reported on.

use std::fmt;

use kube::discovery::ApiResource;
use kube::{Resource, ResourceExt};

use crate::crd::{KnativeBuild, KnativeIstio, KnativeMonitoring, KnativeServing};

/// Identity of one dependent custom resource
#[derive(Clone, Debug)]
pub struct DependentRef {
    /// Namespace the dependent lives in
    pub namespace: String,
    /// Name of the dependent
    pub name: String,
    /// Group, version, kind and plural used to fetch it dynamically
    pub resource: ApiResource,
}

impl DependentRef {
    /// Create a reference with an explicit API resource
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, resource: ApiResource) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            resource,
        }
    }

    /// Create a reference to a typed custom resource
    pub fn of<K: Resource<DynamicType = ()>>(
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::new(namespace, name, ApiResource::erase::<K>(&()))
    }

    /// Kind of the dependent
    pub fn kind(&self) -> &str {
        &self.resource.kind
    }

    /// True if `namespace`/`name` of `kind` is this dependent
    pub fn matches(&self, namespace: &str, name: &str, kind: &str) -> bool {
        self.namespace == namespace && self.name == name && self.resource.kind == kind
    }
}

impl fmt::Display for DependentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Ordered list of the dependents of a root resource
#[derive(Clone, Debug, Default)]
pub struct DependentRegistry {
    entries: Vec<DependentRef>,
}

impl DependentRegistry {
    /// Create a registry from entries in teardown and reporting order
    pub fn new(entries: Vec<DependentRef>) -> Self {
        Self { entries }
    }

    /// The components installed by a Knative resource
    pub fn knative_default() -> Self {
        Self::new(vec![
            DependentRef::of::<KnativeBuild>("knative-build", "default"),
            DependentRef::of::<KnativeIstio>("istio-system", "default"),
            DependentRef::of::<KnativeMonitoring>("knative-monitoring", "default"),
            DependentRef::of::<KnativeServing>("knative-serving", "default"),
        ])
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = &DependentRef> {
        self.entries.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the registry has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry for a typed object, if it is a registered dependent
    pub fn find<D: Resource<DynamicType = ()>>(&self, obj: &D) -> Option<&DependentRef> {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        let kind = D::kind(&());
        self.entries
            .iter()
            .find(|e| e.matches(&namespace, &name, &kind))
    }
}
