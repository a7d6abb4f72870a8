//! Manifest loading from a channel directory
//!
//! Layout of the manifest directory:
//!
//! ```text
//! <dir>/stable                                  channel file
//! <dir>/packages/<component>/<version>/manifest.yaml
//! ```
//!
//! A channel file lists the versions it offers, newest first:
//!
//! ```yaml
//! manifests:
//! - version: 0.3.0
//!   package: knativeserving   # optional, restricts the entry to one component
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use super::ManifestObjects;
use crate::crd::CommonSpec;
use crate::{Error, DEFAULT_CHANNEL};

/// Source of the manifest for one add-on component
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ManifestLoader: Send + Sync {
    /// Load the manifest objects for `component` at the version selected by `spec`
    async fn load(&self, component: &str, spec: &CommonSpec) -> Result<ManifestObjects, Error>;
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    manifests: Vec<ChannelEntry>,
}

#[derive(Debug, Deserialize)]
struct ChannelEntry {
    version: String,
    #[serde(default)]
    package: Option<String>,
}

/// Loads manifests from a directory of channels and packages
#[derive(Clone, Debug)]
pub struct ChannelLoader {
    base_dir: PathBuf,
}

impl ChannelLoader {
    /// Create a loader rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory this loader reads from
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn resolve_version(&self, component: &str, spec: &CommonSpec) -> Result<String, Error> {
        if let Some(version) = &spec.version {
            return Ok(version.clone());
        }

        let channel_name = spec.channel.as_deref().unwrap_or(DEFAULT_CHANNEL);
        validate_path_segment("channel", channel_name)?;
        let path = self.base_dir.join(channel_name);

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::manifest(format!("reading channel {}: {}", path.display(), e)))?;
        let channel: Channel = serde_yaml::from_str(&raw)
            .map_err(|e| Error::manifest(format!("parsing channel {}: {}", path.display(), e)))?;

        channel
            .manifests
            .into_iter()
            .find(|m| m.package.as_deref().map_or(true, |p| p == component))
            .map(|m| m.version)
            .ok_or_else(|| {
                Error::manifest(format!(
                    "channel {} has no version for {}",
                    channel_name, component
                ))
            })
    }
}

#[async_trait]
impl ManifestLoader for ChannelLoader {
    async fn load(&self, component: &str, spec: &CommonSpec) -> Result<ManifestObjects, Error> {
        let version = self.resolve_version(component, spec).await?;
        validate_path_segment("version", &version)?;

        let path = self
            .base_dir
            .join("packages")
            .join(component)
            .join(&version)
            .join("manifest.yaml");
        debug!(component, version = %version, path = %path.display(), "loading manifest");

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::manifest(format!("reading {}: {}", path.display(), e)))?;
        ManifestObjects::parse(&raw)
    }
}

/// Reject values that would escape the manifest directory
fn validate_path_segment(what: &str, value: &str) -> Result<(), Error> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(Error::manifest(format!("invalid {what}: {value:?}")));
    }
    Ok(())
}
