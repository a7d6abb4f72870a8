//! Error types for the add-on operators

use thiserror::Error;

/// Main error type for add-on operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Kubernetes API error (conflict, network, throttling, ...)
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// The requested object does not exist
    #[error("{resource} not found")]
    NotFound {
        /// `<namespace>/<name>` of the missing object
        resource: String,
    },

    /// A prerequisite of the add-on is missing or not ready
    #[error("preflight check failed: {0}")]
    PreflightUnmet(String),

    /// An object was not of the kind the caller expected
    #[error("expected resource to be {expected} but was: {found}")]
    UnexpectedKind {
        /// Kind the caller expected
        expected: String,
        /// Kind that was actually received
        found: String,
    },

    /// Manifest could not be loaded or parsed
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a not-found error for the given `<namespace>/<name>` reference
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a preflight error with the given message
    pub fn preflight(msg: impl Into<String>) -> Self {
        Self::PreflightUnmet(msg.into())
    }

    /// Create a kind mismatch error
    pub fn unexpected_kind(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedKind {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a manifest error with the given message
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Map a kube error into [`Error::NotFound`] when the API server answered 404
    pub fn from_kube(err: kube::Error, resource: impl Into<String>) -> Self {
        match err {
            kube::Error::Api(ref ae) if ae.code == 404 => Self::not_found(resource),
            other => Self::Kube(other),
        }
    }

    /// Returns true if the error means the object is absent
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Kube(kube::Error::Api(ae)) => ae.code == 404,
            _ => false,
        }
    }

    /// Returns true if another reconciliation pass may succeed without a spec change
    ///
    /// Kind mismatches and broken manifests are configuration defects; everything
    /// else is expected to clear up on its own.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::UnexpectedKind { .. } | Self::Manifest(_) | Self::Serialization(_)
        )
    }
}
