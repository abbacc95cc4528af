//! viewlinks sessions
//!
//! Binds the editing core to persistence: load a view, edit it through a
//! [`FormReducer`](viewlinks_form::FormReducer), and save the diff.
//!
//! # Example
//!
//! ```rust,ignore
//! use viewlinks_session::{MemoryStore, ViewSession};
//!
//! let store = MemoryStore::new().with_view("products", ConfigTree::new());
//! let mut session = ViewSession::open(store, "products", EditorConfig::default()).await?;
//! session.dispatch(Action::add_link("coll1"))?;
//! session.save().await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod session;

pub mod store;

pub use error::{SessionError, StoreError};
pub use session::{SaveOutcome, ViewSession, WriteMode};
pub use store::{revision_of, FileStore, MemoryStore, Revision, Snapshot, Validator, ViewStore};
