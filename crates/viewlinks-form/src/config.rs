//! Editor configuration
//!
//! ```toml
//! save_mode = "patch"
//!
//! [normalize]
//! prune_empty_fields = false
//! ```

use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::normalize::NormalizePolicy;

/// How a save is sent to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// Patch when the store supports partial updates, full map otherwise
    #[default]
    Auto,
    /// Always send the full `links` map
    Full,
    /// Always send the patch
    Patch,
}

/// Settings for an editing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub normalize: NormalizePolicy,
    pub save_mode: SaveMode,
}

impl EditorConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_normalize(mut self, policy: NormalizePolicy) -> Self {
        self.normalize = policy;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_save_mode(mut self, mode: SaveMode) -> Self {
        self.save_mode = mode;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Toml`] on malformed input
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse JSON text
    ///
    /// # Errors
    /// Returns [`ConfigError::Json`] on malformed input
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load from a `.json` or TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<FsPath>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }
}
