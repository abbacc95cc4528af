//! Edit actions accepted by the [`FormReducer`](crate::FormReducer)
//!
//! Only [`Action::SetFormState`], [`Action::SetField`],
//! [`Action::SetProperty`] and [`Action::Discard`] are primitive. The
//! link/field helpers are lowered to `SetField` against the current working
//! copy before anything else sees them.

use serde::{Deserialize, Serialize};
use viewlinks_tree::{ConfigTree, Node, Path, PathError};

/// A single edit to the form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Replace the working copy; with `reset_baseline`, the baseline too
    SetFormState {
        tree: ConfigTree,
        #[serde(default)]
        reset_baseline: bool,
    },

    /// Place `value` at `path` ([`Node::Null`] deletes)
    SetField { path: Path, value: Node },

    /// Set a non-structural property of the definition at `path`
    SetProperty { path: Path, key: String, value: Node },

    /// `SetField(links[name], {})` unless the link exists
    AddLink { name: String },

    /// `SetField(links[name], null)`
    RemoveLink { name: String },

    /// `SetField(parent.fields[name], {})` unless the field exists
    AddField { parent: Path, name: String },

    /// `SetField(path, null)`
    RemoveField { path: Path },

    /// Reset the working copy to the baseline
    Discard,
}

impl Action {
    /// Seed both working copy and baseline
    #[inline]
    #[must_use]
    pub fn load(tree: ConfigTree) -> Self {
        Self::SetFormState {
            tree,
            reset_baseline: true,
        }
    }

    /// Replace only the working copy
    #[inline]
    #[must_use]
    pub fn set_form_state(tree: ConfigTree) -> Self {
        Self::SetFormState {
            tree,
            reset_baseline: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn set_field(path: Path, value: impl Into<Node>) -> Self {
        Self::SetField {
            path,
            value: value.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn set_property(path: Path, key: impl Into<String>, value: impl Into<Node>) -> Self {
        Self::SetProperty {
            path,
            key: key.into(),
            value: value.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn add_link(name: impl Into<String>) -> Self {
        Self::AddLink { name: name.into() }
    }

    #[inline]
    #[must_use]
    pub fn remove_link(name: impl Into<String>) -> Self {
        Self::RemoveLink { name: name.into() }
    }

    #[inline]
    #[must_use]
    pub fn add_field(parent: Path, name: impl Into<String>) -> Self {
        Self::AddField {
            parent,
            name: name.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn remove_field(path: Path) -> Self {
        Self::RemoveField { path }
    }

    /// Short name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetFormState { .. } => "set_form_state",
            Self::SetField { .. } => "set_field",
            Self::SetProperty { .. } => "set_property",
            Self::AddLink { .. } => "add_link",
            Self::RemoveLink { .. } => "remove_link",
            Self::AddField { .. } => "add_field",
            Self::RemoveField { .. } => "remove_field",
            Self::Discard => "discard",
        }
    }

    /// Path this action edits, if any
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        match self {
            Self::SetField { path, .. }
            | Self::SetProperty { path, .. }
            | Self::RemoveField { path } => Some(path),
            Self::AddField { parent, .. } => Some(parent),
            _ => None,
        }
    }

    /// Check if this action removes something from the tree
    #[must_use]
    pub fn is_removal(&self) -> bool {
        match self {
            Self::SetField { value, .. } | Self::SetProperty { value, .. } => value.is_null(),
            Self::RemoveLink { .. } | Self::RemoveField { .. } => true,
            _ => false,
        }
    }

    /// Rewrite helper actions into their primitive form
    ///
    /// Returns `Ok(None)` when the action would not change `working`
    /// (adding a link or field that already exists).
    ///
    /// # Errors
    /// Returns [`PathError`] for empty names or traversal through a leaf
    pub(crate) fn lower(self, working: &ConfigTree) -> Result<Option<Self>, PathError> {
        let lowered = match self {
            Self::AddLink { name } => {
                let path = Path::link(name)?;
                if working.get(&path)?.is_some() {
                    return Ok(None);
                }
                Self::set_field(path, Node::empty_map())
            }
            Self::RemoveLink { name } => Self::set_field(Path::link(name)?, Node::Null),
            Self::AddField { parent, name } => {
                let path = parent.child(name)?;
                if working.get(&path)?.is_some() {
                    return Ok(None);
                }
                Self::set_field(path, Node::empty_map())
            }
            Self::RemoveField { path } => Self::set_field(path, Node::Null),
            primitive => primitive,
        };
        Ok(Some(lowered))
    }
}
