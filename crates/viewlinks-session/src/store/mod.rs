//! Persistence of view link configurations
//!
//! A [`ViewStore`] loads a view's tree together with its [`Revision`], and
//! accepts either a full replacement or a [`Patch`]. Writes carry the
//! revision the caller started from; a store whose current revision differs
//! rejects the write with [`StoreError::RevisionMismatch`].

use std::fmt;
use std::sync::Arc;

use viewlinks_tree::{apply_patch, escape_key, ConfigTree, ContentHash, DefinitionView, Patch};

use crate::error::StoreError;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Revision token of a stored view
pub type Revision = ContentHash;

/// Tree as loaded from a store
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub tree: ConfigTree,
    pub revision: Revision,
}

impl Snapshot {
    /// Snapshot of `tree` with its content revision
    ///
    /// # Errors
    /// Returns [`StoreError::Hash`] if the tree cannot be encoded
    pub fn of(tree: ConfigTree) -> Result<Self, StoreError> {
        let revision = revision_of(&tree)?;
        Ok(Self { tree, revision })
    }
}

/// Content revision of a tree
///
/// # Errors
/// Returns [`StoreError::Hash`] if the tree cannot be encoded
pub fn revision_of(tree: &ConfigTree) -> Result<Revision, StoreError> {
    Ok(tree.content_hash()?)
}

/// Backend holding view definitions
#[async_trait::async_trait]
pub trait ViewStore: Send + Sync {
    /// Fetch a view's tree and revision
    async fn load(&self, view: &str) -> Result<Snapshot, StoreError>;

    /// Replace the whole `links` map
    async fn replace_links(
        &self,
        view: &str,
        tree: &ConfigTree,
        expected: &Revision,
    ) -> Result<Revision, StoreError>;

    /// Apply a patch to the stored `links` map
    async fn patch_links(
        &self,
        view: &str,
        patch: &Patch,
        expected: &Revision,
    ) -> Result<Revision, StoreError>;

    /// Whether [`patch_links`](Self::patch_links) is available
    fn supports_partial_updates(&self) -> bool {
        true
    }
}

/// Extra payload check run before a write is accepted
///
/// Returns a user-facing message on rejection.
#[derive(Clone)]
pub struct Validator(Arc<dyn Fn(&ConfigTree) -> Result<(), String> + Send + Sync>);

impl Validator {
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&ConfigTree) -> Result<(), String> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Reject analyzers outside `known`
    pub fn known_analyzers<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let known: Vec<String> = known.into_iter().map(Into::into).collect();
        Self::new(move |tree| {
            for name in tree.link_names() {
                if let Some(link) = tree.link(name) {
                    check_analyzers(&known, &format!("links[{}]", escape_key(name)), link)?;
                }
            }
            Ok(())
        })
    }

    /// Run the check
    ///
    /// # Errors
    /// Returns [`StoreError::Validation`] with the rejection message
    pub fn check(&self, tree: &ConfigTree) -> Result<(), StoreError> {
        (self.0)(tree).map_err(StoreError::Validation)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

fn check_analyzers(
    known: &[String],
    location: &str,
    definition: DefinitionView<'_>,
) -> Result<(), String> {
    for analyzer in definition.analyzers().unwrap_or_default() {
        if !known.iter().any(|k| k == analyzer) {
            return Err(format!("unknown analyzer '{analyzer}' at {location}"));
        }
    }
    for (name, field) in definition.fields() {
        check_analyzers(known, &format!("{location}.fields[{}]", escape_key(name)), field)?;
    }
    Ok(())
}

/// What a write asks for
#[derive(Debug, Clone, Copy)]
pub(crate) enum Write<'a> {
    Replace(&'a ConfigTree),
    Patch(&'a Patch),
}

/// Check the expected revision and compute the tree a write produces
pub(crate) fn prepare_write(
    current: &ConfigTree,
    expected: &Revision,
    write: Write<'_>,
    validator: Option<&Validator>,
) -> Result<ConfigTree, StoreError> {
    let actual = revision_of(current)?;
    if actual != *expected {
        return Err(StoreError::RevisionMismatch {
            expected: *expected,
            actual,
        });
    }

    let next = match write {
        Write::Replace(tree) => tree.clone(),
        Write::Patch(patch) => apply_patch(current, patch),
    };
    next.validate()
        .map_err(|err| StoreError::validation(err.to_string()))?;
    if let Some(validator) = validator {
        validator.check(&next)?;
    }
    Ok(next)
}
