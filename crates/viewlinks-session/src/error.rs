//! Error types for stores and sessions
//!
//! [`StoreError`] is what a [`ViewStore`](crate::ViewStore) reports.
//! [`SessionError`] is what callers of [`ViewSession`](crate::ViewSession)
//! see; the three expected runtime failures (validation, network, concurrent
//! edit) each get their own variant.

use std::path::PathBuf;

use viewlinks_form::FormError;
use viewlinks_tree::{HashError, TreeError};

use crate::store::Revision;

/// Failure inside a store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No such view
    #[error("view not found: {0}")]
    ViewNotFound(String),

    /// View name cannot be stored
    #[error("invalid view name: {0:?}")]
    InvalidViewName(String),

    /// Payload rejected (e.g. unknown analyzer)
    #[error("{0}")]
    Validation(String),

    /// Transport failure
    #[error("network error: {0}")]
    Network(String),

    /// Stored revision moved since the caller loaded it
    #[error("revision mismatch: expected {expected}, found {actual}")]
    RevisionMismatch { expected: Revision, actual: Revision },

    /// Store cannot apply patches
    #[error("partial updates are not supported by this store")]
    PartialUpdatesUnsupported,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed stored view: {0}")]
    Tree(#[from] TreeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("hash error: {0}")]
    Hash(#[from] HashError),
}

impl StoreError {
    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a session operation
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Store rejected the payload; the working copy is unchanged
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Transport failure; nothing was retried
    #[error("network error: {message}")]
    Network { message: String },

    /// Stored view changed since it was loaded; reload required
    #[error("view was modified concurrently (expected revision {expected}, found {actual})")]
    ConcurrentEdit { expected: Revision, actual: Revision },

    #[error("view not found: {view}")]
    NotFound { view: String },

    /// Reload would drop unsaved edits
    #[error("unsaved changes would be discarded")]
    UnsavedChanges,

    /// Action rejected by the reducer
    #[error(transparent)]
    Form(#[from] FormError),

    /// Any other store failure
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl SessionError {
    /// Check if the user can act on this error without a code change
    #[inline]
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Network { .. }
                | Self::ConcurrentEdit { .. }
                | Self::UnsavedChanges
        )
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => Self::Validation { message },
            StoreError::Network(message) => Self::Network { message },
            StoreError::RevisionMismatch { expected, actual } => {
                Self::ConcurrentEdit { expected, actual }
            }
            StoreError::ViewNotFound(view) => Self::NotFound { view },
            other => Self::Store(other),
        }
    }
}
