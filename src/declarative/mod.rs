//! Declarative manifest engine
//!
//! Loads an add-on's static manifest from a channel directory, prepares the
//! objects (namespace, labels, owner references), hands them to an optional
//! object transform, server-side applies them and finally runs an optional
//! status hook. Controllers customise a pass only through those hooks.

mod applier;
mod loader;
pub mod manifest;
mod reconciler;

pub use applier::{KubeApplier, ManifestApplier};
pub use loader::{ChannelLoader, ManifestLoader};
pub use manifest::ManifestObjects;
pub use reconciler::{DeclarativeReconciler, ObjectTransform, OwnerStrategy, StatusHook};

#[cfg(test)]
pub use applier::MockManifestApplier;
#[cfg(test)]
pub use loader::MockManifestLoader;
