//! In-process store
//!
//! Clones share state, so a test can keep a handle to play the server side
//! (inspect stored trees, overwrite them, inject network failures).

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;
use viewlinks_tree::{ConfigTree, Patch};

use super::{prepare_write, Revision, Snapshot, Validator, ViewStore, Write};
use crate::error::StoreError;

#[derive(Clone)]
pub struct MemoryStore {
    views: Arc<RwLock<HashMap<String, ConfigTree>>>,
    failures: Arc<Mutex<VecDeque<String>>>,
    writes: Arc<AtomicUsize>,
    validator: Option<Validator>,
    partial_updates: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            views: Arc::default(),
            failures: Arc::default(),
            writes: Arc::default(),
            validator: None,
            partial_updates: true,
        }
    }
}

impl MemoryStore {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a view
    #[must_use]
    pub fn with_view(self, view: impl Into<String>, tree: ConfigTree) -> Self {
        self.insert(view, tree);
        self
    }

    /// Check every write with `validator`
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Refuse patch writes
    #[must_use]
    pub fn without_partial_updates(mut self) -> Self {
        self.partial_updates = false;
        self
    }

    /// Store `tree` directly, bypassing revision checks
    pub fn insert(&self, view: impl Into<String>, tree: ConfigTree) {
        self.views.write().insert(view.into(), tree);
    }

    /// Current stored tree
    #[must_use]
    pub fn get(&self, view: &str) -> Option<ConfigTree> {
        self.views.read().get(view).cloned()
    }

    /// Make the next operation fail with a network error
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.lock().push_back(message.into());
    }

    /// Number of accepted writes
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn injected_failure(&self) -> Result<(), StoreError> {
        match self.failures.lock().pop_front() {
            Some(message) => Err(StoreError::network(message)),
            None => Ok(()),
        }
    }

    fn write(
        &self,
        view: &str,
        expected: &Revision,
        write: Write<'_>,
    ) -> Result<Revision, StoreError> {
        self.injected_failure()?;

        let mut views = self.views.write();
        let current = views
            .get(view)
            .ok_or_else(|| StoreError::ViewNotFound(view.to_string()))?;
        let next = prepare_write(current, expected, write, self.validator.as_ref())?;
        let snapshot = Snapshot::of(next)?;
        views.insert(view.to_string(), snapshot.tree);
        self.writes.fetch_add(1, Ordering::SeqCst);

        debug!(view, revision = %snapshot.revision.short(), "memory store write");
        Ok(snapshot.revision)
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("views", &self.views.read().len())
            .field("writes", &self.writes())
            .field("validator", &self.validator.is_some())
            .field("partial_updates", &self.partial_updates)
            .finish()
    }
}

#[async_trait::async_trait]
impl ViewStore for MemoryStore {
    async fn load(&self, view: &str) -> Result<Snapshot, StoreError> {
        self.injected_failure()?;
        let tree = self
            .get(view)
            .ok_or_else(|| StoreError::ViewNotFound(view.to_string()))?;
        Snapshot::of(tree)
    }

    async fn replace_links(
        &self,
        view: &str,
        tree: &ConfigTree,
        expected: &Revision,
    ) -> Result<Revision, StoreError> {
        self.write(view, expected, Write::Replace(tree))
    }

    async fn patch_links(
        &self,
        view: &str,
        patch: &Patch,
        expected: &Revision,
    ) -> Result<Revision, StoreError> {
        if !self.partial_updates {
            return Err(StoreError::PartialUpdatesUnsupported);
        }
        self.write(view, expected, Write::Patch(patch))
    }

    fn supports_partial_updates(&self) -> bool {
        self.partial_updates
    }
}
