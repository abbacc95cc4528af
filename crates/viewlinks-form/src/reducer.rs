//! Form state and its reducer
//!
//! Every action is reduced into a complete next [`FormState`] before it is
//! committed, so readers never observe a half-applied edit. A failed action
//! leaves the state as it was.

use tracing::{debug, warn};
use viewlinks_tree::{address, compute_diff, ConfigTree, Patch};

use crate::action::Action;
use crate::error::FormError;
use crate::normalize::{Normalize, NormalizePolicy};

/// Working copy and baseline of one editing session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormState {
    working: ConfigTree,
    baseline: ConfigTree,
    revision: u64,
}

impl FormState {
    /// State with working copy and baseline both set to `tree`
    #[must_use]
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            working: tree.clone(),
            baseline: tree,
            revision: 0,
        }
    }

    /// Tree being edited
    #[inline]
    #[must_use]
    pub fn working_copy(&self) -> &ConfigTree {
        &self.working
    }

    /// Last confirmed tree
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &ConfigTree {
        &self.baseline
    }

    /// Commit counter, bumped whenever working copy or baseline changes
    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Check if the working copy has diverged from the baseline
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.working != self.baseline
    }

    /// Patch from baseline to working copy
    #[must_use]
    pub fn pending_patch(&self) -> Patch {
        compute_diff(&self.baseline, &self.working)
    }
}

/// Applies [`Action`]s to a [`FormState`] one at a time
#[derive(Debug, Clone)]
pub struct FormReducer<N = NormalizePolicy> {
    state: FormState,
    normalizer: N,
}

impl FormReducer<NormalizePolicy> {
    /// Reducer seeded with `tree`, using the default policy
    #[must_use]
    pub fn new(tree: ConfigTree) -> Self {
        Self::with_normalizer(tree, NormalizePolicy::default())
    }
}

impl<N: Normalize> FormReducer<N> {
    /// Reducer seeded with `tree` and a custom normalizer
    #[must_use]
    pub fn with_normalizer(tree: ConfigTree, normalizer: N) -> Self {
        Self {
            state: FormState::new(tree),
            normalizer,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn working_copy(&self) -> &ConfigTree {
        self.state.working_copy()
    }

    #[inline]
    #[must_use]
    pub fn baseline(&self) -> &ConfigTree {
        self.state.baseline()
    }

    #[inline]
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.revision()
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// Apply one action
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    /// - [`FormError::Path`] for malformed paths or traversal through a leaf
    /// - [`FormError::InvalidTree`] if the normalized result is malformed
    pub fn dispatch(&mut self, action: Action) -> Result<bool, FormError> {
        let name = action.name();
        match reduce(&self.state, action, &self.normalizer) {
            Ok(Some(next)) => {
                self.state = next;
                debug!(
                    action = name,
                    revision = self.state.revision,
                    dirty = self.state.is_dirty(),
                    "action applied"
                );
                Ok(true)
            }
            Ok(None) => {
                debug!(action = name, "action left state unchanged");
                Ok(false)
            }
            Err(err) => {
                warn!(action = name, error = %err, "action rejected");
                Err(err)
            }
        }
    }

    /// Apply actions in order, stopping at the first failure
    ///
    /// Actions before the failing one stay committed.
    ///
    /// # Errors
    /// Returns the first [`FormError`]
    pub fn dispatch_all<I>(&mut self, actions: I) -> Result<(), FormError>
    where
        I: IntoIterator<Item = Action>,
    {
        for action in actions {
            self.dispatch(action)?;
        }
        Ok(())
    }

    /// Make the working copy the new baseline (after a successful save)
    pub fn promote(&mut self) {
        if self.state.is_dirty() {
            self.state.baseline = self.state.working.clone();
            self.state.revision += 1;
        }
        debug!(revision = self.state.revision, "working copy promoted");
    }

    /// Patch from baseline to working copy
    #[must_use]
    pub fn pending_patch(&self) -> Patch {
        self.state.pending_patch()
    }
}

/// Compute the state following `action`
///
/// Returns `Ok(None)` when the action does not change anything.
///
/// # Errors
/// See [`FormReducer::dispatch`]
pub fn reduce<N: Normalize>(
    state: &FormState,
    action: Action,
    normalizer: &N,
) -> Result<Option<FormState>, FormError> {
    let (working, baseline) = match action {
        Action::SetFormState {
            tree,
            reset_baseline,
        } => {
            tree.validate()?;
            let baseline = if reset_baseline {
                tree.clone()
            } else {
                state.baseline.clone()
            };
            (tree, baseline)
        }
        Action::Discard => (state.baseline.clone(), state.baseline.clone()),
        edit => {
            let Some(edit) = edit.lower(&state.working)? else {
                return Ok(None);
            };
            let edited = match &edit {
                Action::SetField { path, value } => {
                    address::set(&state.working, path, value.clone())?
                }
                Action::SetProperty { path, key, value } => {
                    address::set_property(&state.working, path, key, value.clone())?
                }
                _ => return Ok(None),
            };
            let normalized = normalizer.normalize(edited, &edit, &state.baseline);
            normalized.validate()?;
            (normalized, state.baseline.clone())
        }
    };

    if working == state.working && baseline == state.baseline {
        return Ok(None);
    }
    Ok(Some(FormState {
        working,
        baseline,
        revision: state.revision + 1,
    }))
}
