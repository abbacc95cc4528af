//! viewlinks editing core
//!
//! Holds a `{working copy, baseline}` pair and applies edit actions to it.
//!
//! # Core Concepts
//!
//! - [`FormReducer`]: applies [`Action`]s one at a time, atomically
//! - [`Normalize`]: pure post-edit hook; [`NormalizePolicy`] is the default
//! - [`Selector`]: derived state memoized on the reducer revision
//! - [`Navigator`]: UI route ↔ [`Path`](viewlinks_tree::Path) mapping and
//!   panel state machine
//!
//! # Example
//!
//! ```rust,ignore
//! use viewlinks_form::{Action, FormReducer};
//!
//! let mut form = FormReducer::new(ConfigTree::new());
//! form.dispatch(Action::add_link("coll1"))?;
//! form.dispatch(Action::set_field(parse("links[coll1].fields[name]")?, Node::empty_map()))?;
//! assert!(form.is_dirty());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod action;
mod config;
mod error;
mod normalize;
mod reducer;

pub mod navigation;
pub mod selectors;

pub use action::Action;
pub use config::{EditorConfig, SaveMode};
pub use error::{ConfigError, FormError, NavigationError};
pub use navigation::{
    breadcrumbs, decompose_route, recompose, Navigator, PanelEvent, PanelState, Route,
};
pub use normalize::{Identity, Normalize, NormalizePolicy};
pub use reducer::{reduce, FormReducer, FormState};
pub use selectors::{editor_summary, summary_selector, EditorSummary, Selector};
