//! Memoized derived state
//!
//! A [`Selector`] recomputes only when the state's revision moves. Use one
//! selector per reducer: revisions are not comparable across reducers.

use serde::Serialize;
use viewlinks_tree::PatchSummary;

use crate::reducer::FormState;

/// Cached projection of a [`FormState`]
pub struct Selector<T, F> {
    compute: F,
    cache: Option<(u64, T)>,
    computations: usize,
}

impl<T, F> Selector<T, F>
where
    F: Fn(&FormState) -> T,
{
    #[must_use]
    pub fn new(compute: F) -> Self {
        Self {
            compute,
            cache: None,
            computations: 0,
        }
    }

    /// Current value, recomputed if `state` has a different revision
    pub fn get(&mut self, state: &FormState) -> &T {
        let revision = state.revision();
        if self
            .cache
            .as_ref()
            .is_some_and(|(cached, _)| *cached != revision)
        {
            self.cache = None;
        }
        let compute = &self.compute;
        let computations = &mut self.computations;
        let (_, value) = self.cache.get_or_insert_with(|| {
            *computations += 1;
            (revision, compute(state))
        });
        value
    }

    /// Number of times the projection ran
    #[inline]
    #[must_use]
    pub fn computations(&self) -> usize {
        self.computations
    }
}

impl<T: std::fmt::Debug, F> std::fmt::Debug for Selector<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("cache", &self.cache)
            .field("computations", &self.computations)
            .finish_non_exhaustive()
    }
}

/// What the editor chrome needs to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSummary {
    pub dirty: bool,
    pub link_names: Vec<String>,
    pub field_count: usize,
    pub pending: PatchSummary,
}

/// Project the editor summary out of a state
#[must_use]
pub fn editor_summary(state: &FormState) -> EditorSummary {
    let working = state.working_copy();
    EditorSummary {
        dirty: state.is_dirty(),
        link_names: working.link_names().map(str::to_string).collect(),
        field_count: working.field_count(),
        pending: state.pending_patch().summary(),
    }
}

/// Selector type returned by [`summary_selector`]
pub type SummarySelector = Selector<EditorSummary, fn(&FormState) -> EditorSummary>;

#[must_use]
pub fn summary_selector() -> SummarySelector {
    Selector::new(editor_summary as fn(&FormState) -> EditorSummary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, FormReducer};
    use viewlinks_tree::ConfigTree;

    #[test]
    fn recomputes_only_on_new_revision() {
        let mut reducer = FormReducer::new(ConfigTree::new());
        let mut selector = summary_selector();

        assert!(!selector.get(reducer.state()).dirty);
        assert!(!selector.get(reducer.state()).dirty);
        assert_eq!(selector.computations(), 1);

        reducer.dispatch(Action::add_link("coll1")).unwrap();
        let summary = selector.get(reducer.state()).clone();
        assert!(summary.dirty);
        assert_eq!(summary.link_names, vec!["coll1".to_string()]);
        assert_eq!(summary.pending.assignments, 1);
        assert_eq!(selector.computations(), 2);
    }

    #[test]
    fn noop_action_keeps_cache() {
        let mut reducer = FormReducer::new(ConfigTree::new());
        let mut selector =
            Selector::new(|state: &FormState| state.working_copy().link_names().count());
        reducer.dispatch(Action::add_link("a")).unwrap();
        assert_eq!(*selector.get(reducer.state()), 1);
        reducer.dispatch(Action::add_link("a")).unwrap();
        assert_eq!(*selector.get(reducer.state()), 1);
        assert_eq!(selector.computations(), 1);
    }
}
