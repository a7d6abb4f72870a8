//! Event routing for the Knative controller
//!
//! There is a single Knative root per cluster. Changes to its registered
//! dependents, and the appearance or disappearance of the preflight
//! Deployment, are all mapped back onto that one root.

use std::sync::Arc;

use futures::{future, Stream, StreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher;
use kube::Resource;
use tracing::debug;

use super::registry::DependentRegistry;
use crate::crd::Knative;

/// Maps watched objects to the root they affect
#[derive(Clone)]
pub struct EventRouter {
    root: ObjectRef<Knative>,
    registry: Arc<DependentRegistry>,
}

impl EventRouter {
    /// Route events to the root `namespace/name`
    pub fn new(name: &str, namespace: &str, registry: Arc<DependentRegistry>) -> Self {
        Self {
            root: ObjectRef::new(name).within(namespace),
            registry,
        }
    }

    /// The root every event is routed to
    pub fn root(&self) -> ObjectRef<Knative> {
        self.root.clone()
    }

    /// Route a change of a dependent custom resource
    ///
    /// Objects that merely share a kind with a dependent are ignored.
    pub fn map_dependent<D: Resource<DynamicType = ()>>(
        &self,
        obj: &D,
    ) -> Option<ObjectRef<Knative>> {
        let target = self.registry.find(obj)?;
        debug!(dependent = %target, root = %self.root, "dependent changed");
        Some(self.root.clone())
    }

    /// Route an appearance or disappearance of the preflight Deployment
    pub fn map_deployment(&self, _deployment: &Deployment) -> Option<ObjectRef<Knative>> {
        Some(self.root.clone())
    }
}

/// Tracks whether the watched Deployment exists
///
/// Fires when the Deployment appears or disappears, never on updates. The
/// watch is expected to be restricted to a single Deployment.
#[derive(Debug, Default)]
pub struct DeploymentPresence {
    present: Option<Deployment>,
    seen_in_relist: bool,
}

impl DeploymentPresence {
    /// Feed one watcher event; returns the Deployment if its presence changed
    pub fn observe(&mut self, event: &watcher::Event<Deployment>) -> Option<Deployment> {
        match event {
            watcher::Event::Apply(d) => self.saw(d),
            watcher::Event::InitApply(d) => {
                self.seen_in_relist = true;
                self.saw(d)
            }
            watcher::Event::Delete(d) => {
                self.present = None;
                Some(d.clone())
            }
            watcher::Event::Init => {
                self.seen_in_relist = false;
                None
            }
            // A relist that no longer contains the Deployment means we missed its deletion
            watcher::Event::InitDone => {
                if self.seen_in_relist {
                    None
                } else {
                    self.present.take()
                }
            }
        }
    }

    fn saw(&mut self, deployment: &Deployment) -> Option<Deployment> {
        let created = self.present.is_none();
        self.present = Some(deployment.clone());
        created.then(|| deployment.clone())
    }
}

/// Reduce a Deployment watch to presence changes
pub fn presence_changes<S>(events: S) -> impl Stream<Item = Result<Deployment, watcher::Error>>
where
    S: Stream<Item = Result<watcher::Event<Deployment>, watcher::Error>>,
{
    events
        .scan(DeploymentPresence::default(), |presence, event| {
            let out = match event {
                Ok(event) => presence.observe(&event).map(Ok),
                Err(e) => Some(Err(e)),
            };
            future::ready(Some(out))
        })
        .filter_map(future::ready)
}
