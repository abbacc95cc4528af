//! viewlinks tree model
//!
//! Recursive link/field configuration of a search view, with typed paths and
//! structural diffing.
//!
//! # Core Concepts
//!
//! - [`ConfigTree`]: `links` → definition → `fields` → definition → …
//! - [`Node`]: leaf, map, or the [`Node::Null`] removal marker
//! - [`Path`]: typed address such as `links[products].fields[name]`
//! - [`Patch`]: minimal change set, produced by [`compute_diff`]
//!
//! # Example
//!
//! ```rust,ignore
//! use viewlinks_tree::{apply_patch, compute_diff, parse, ConfigTree, Node};
//!
//! let baseline = ConfigTree::from_json(r#"{"links": {}}"#)?;
//! let working = baseline.set(&parse("links[coll1].fields[name]")?, Node::empty_map())?;
//!
//! let patch = compute_diff(&baseline, &working);
//! assert_eq!(apply_patch(&baseline, &patch), working);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod diff;
mod hash;
mod node;
mod patch;
mod path;
mod tree;

/// Path-addressed reads and copy-on-write writes
pub mod address;

pub use diff::{apply_patch, compute_diff};
pub use hash::{ContentHash, HashError};
pub use node::{LeafValue, MapNode, Node, NodeError};
pub use patch::{Patch, PatchSummary};
pub use path::{escape_key, parse, Container, Path, PathError, Segment, FIELDS_KEY};
pub use tree::{
    ConfigTree, DefinitionView, TreeError, ANALYZERS_KEY, INCLUDE_ALL_FIELDS_KEY,
    STORE_VALUES_KEY, TRACK_LIST_POSITIONS_KEY,
};
