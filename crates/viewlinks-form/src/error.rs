//! Error types for the editing core
//!
//! - [`FormError`]: an action could not be applied to the working copy
//! - [`NavigationError`]: a UI route does not map to a path
//! - [`ConfigError`]: editor configuration could not be loaded

use std::path::PathBuf;

use viewlinks_tree::{PathError, TreeError};

/// Failure applying an action
///
/// The reducer state is left untouched when this is returned.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Malformed path or traversal through a leaf
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// The edit would leave a malformed tree behind
    #[error("edit rejected: {0}")]
    InvalidTree(#[from] TreeError),
}

/// Route that cannot be mapped to a tree path
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// No segments after the view name
    #[error("route has no segments")]
    EmptyRoute,

    /// No view name at all
    #[error("route has no view name")]
    MissingView,

    /// Blank segment (e.g. `a//b`)
    #[error("route segment {index} is empty")]
    EmptySegment { index: usize },
}

/// Failure loading editor configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
