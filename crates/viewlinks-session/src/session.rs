//! An editing session over one stored view
//!
//! Owns the [`FormReducer`] for the view and the revision it was loaded at.
//! `save` takes `&mut self`, so at most one save can be in flight.

use serde::Serialize;
use tracing::{error, info, warn};
use viewlinks_form::{
    Action, EditorConfig, FormReducer, Navigator, NormalizePolicy, PanelEvent, SaveMode,
};
use viewlinks_tree::{ConfigTree, Patch, PatchSummary};

use crate::error::SessionError;
use crate::store::{Revision, ViewStore};

/// How a save reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Full,
    Patch,
}

/// Result of [`ViewSession::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to save; no write was issued
    Unchanged,
    /// Store accepted the write and the working copy became the baseline
    Saved {
        revision: Revision,
        summary: PatchSummary,
        mode: WriteMode,
    },
}

/// Editing session bound to a store and a view
#[derive(Debug)]
pub struct ViewSession<S> {
    store: S,
    view: String,
    config: EditorConfig,
    form: FormReducer<NormalizePolicy>,
    revision: Revision,
    navigator: Navigator,
}

impl<S: ViewStore> ViewSession<S> {
    /// Load `view` and seed working copy and baseline from it
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] or [`SessionError::Network`] from
    /// the store
    pub async fn open(
        store: S,
        view: impl Into<String>,
        config: EditorConfig,
    ) -> Result<Self, SessionError> {
        let view = view.into();
        let snapshot = store.load(&view).await.map_err(|err| {
            error!(view = %view, error = %err, "failed to load view");
            SessionError::from(err)
        })?;
        info!(
            view = %view,
            revision = %snapshot.revision.short(),
            links = snapshot.tree.links().len(),
            "view loaded"
        );

        Ok(Self {
            form: FormReducer::with_normalizer(snapshot.tree, config.normalize),
            revision: snapshot.revision,
            navigator: Navigator::new(),
            store,
            view,
            config,
        })
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &str {
        &self.view
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reducer, for selectors and read access
    #[inline]
    #[must_use]
    pub fn form(&self) -> &FormReducer<NormalizePolicy> {
        &self.form
    }

    #[inline]
    #[must_use]
    pub fn working_copy(&self) -> &ConfigTree {
        self.form.working_copy()
    }

    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &ConfigTree {
        self.form.baseline()
    }

    /// Store revision the baseline corresponds to
    #[inline]
    #[must_use]
    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.form.is_dirty()
    }

    /// Patch a save would send
    #[must_use]
    pub fn pending_patch(&self) -> Patch {
        self.form.pending_patch()
    }

    #[inline]
    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[inline]
    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    /// Apply an edit to the working copy
    ///
    /// # Errors
    /// Returns [`SessionError::Form`] if the reducer rejects the action
    pub fn dispatch(&mut self, action: Action) -> Result<bool, SessionError> {
        Ok(self.form.dispatch(action)?)
    }

    /// Drop unsaved edits
    ///
    /// # Errors
    /// See [`dispatch`](Self::dispatch)
    pub fn discard(&mut self) -> Result<bool, SessionError> {
        if self.form.is_dirty() {
            info!(view = %self.view, "unsaved edits discarded");
        }
        self.dispatch(Action::Discard)
    }

    fn write_mode(&self) -> WriteMode {
        let partial = self.store.supports_partial_updates();
        match self.config.save_mode {
            SaveMode::Full => WriteMode::Full,
            SaveMode::Auto if partial => WriteMode::Patch,
            SaveMode::Auto => WriteMode::Full,
            SaveMode::Patch if partial => WriteMode::Patch,
            SaveMode::Patch => {
                warn!(view = %self.view, "store has no partial updates, sending full map");
                WriteMode::Full
            }
        }
    }

    /// Persist the working copy
    ///
    /// On success the working copy becomes the baseline. On failure both are
    /// left untouched so no edit is lost.
    ///
    /// # Errors
    /// - [`SessionError::Validation`] if the store rejects the payload
    /// - [`SessionError::Network`] on transport failure
    /// - [`SessionError::ConcurrentEdit`] if the stored view moved on
    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        let patch = self.form.pending_patch();
        if patch.is_empty() {
            info!(view = %self.view, "nothing to save");
            return Ok(SaveOutcome::Unchanged);
        }

        let summary = patch.summary();
        let mode = self.write_mode();
        let result = match mode {
            WriteMode::Patch => {
                self.store
                    .patch_links(&self.view, &patch, &self.revision)
                    .await
            }
            WriteMode::Full => {
                self.store
                    .replace_links(&self.view, self.form.working_copy(), &self.revision)
                    .await
            }
        };

        match result {
            Ok(revision) => {
                self.form.promote();
                self.revision = revision;
                info!(
                    view = %self.view,
                    revision = %revision.short(),
                    mode = ?mode,
                    removals = summary.removals,
                    assignments = summary.assignments,
                    "view saved"
                );
                Ok(SaveOutcome::Saved {
                    revision,
                    summary,
                    mode,
                })
            }
            Err(err) => {
                let err = SessionError::from(err);
                match &err {
                    SessionError::Network { .. } => {
                        error!(view = %self.view, error = %err, "save failed");
                    }
                    _ => warn!(view = %self.view, error = %err, "save rejected"),
                }
                Err(err)
            }
        }
    }

    /// Replace baseline and working copy with the stored view
    ///
    /// # Errors
    /// - [`SessionError::UnsavedChanges`] if dirty and `confirm_discard` is
    ///   unset
    /// - store errors as for [`open`](Self::open)
    pub async fn reload(&mut self, confirm_discard: bool) -> Result<(), SessionError> {
        if self.form.is_dirty() && !confirm_discard {
            return Err(SessionError::UnsavedChanges);
        }

        let snapshot = self.store.load(&self.view).await?;
        self.form.dispatch(Action::load(snapshot.tree))?;
        self.revision = snapshot.revision;

        let stale = self
            .navigator
            .current()
            .is_some_and(|path| !matches!(self.form.working_copy().get(path), Ok(Some(_))));
        if stale {
            self.navigator.handle(PanelEvent::Back);
        }

        info!(view = %self.view, revision = %self.revision.short(), "view reloaded");
        Ok(())
    }
}
