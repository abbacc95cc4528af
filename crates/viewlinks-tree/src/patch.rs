//! Minimal patches between two trees
//!
//! A [`Patch`] mirrors the tree shape but only carries what changed.
//! [`Node::Null`] entries mark removals.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::node::{MapNode, Node};

/// Change set over the `links` map of a tree
///
/// Serialized as `{"links": {...}}`, with `null` for removed keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Patch {
    #[serde(default)]
    links: MapNode,
}

impl Patch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a raw link map (tombstones allowed)
    #[inline]
    #[must_use]
    pub fn from_links(links: MapNode) -> Self {
        Self { links }
    }

    /// Changed entries of the link map
    #[inline]
    #[must_use]
    pub fn links(&self) -> &MapNode {
        &self.links
    }

    /// Consume into the raw link map
    #[inline]
    #[must_use]
    pub fn into_links(self) -> MapNode {
        self.links
    }

    /// Check if applying this patch would be a no-op
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Names of links touched by this patch
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// Wire form, `{"links": {...}}`
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        serde_json::json!({ "links": Node::Map(self.links.clone()).to_json_value() })
    }

    /// Serialize to JSON text
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Count removals and assignments
    #[must_use]
    pub fn summary(&self) -> PatchSummary {
        let mut summary = PatchSummary {
            touched_links: self.links.keys().cloned().collect(),
            ..PatchSummary::default()
        };
        tally(&self.links, &mut summary);
        summary
    }
}

fn tally(map: &MapNode, summary: &mut PatchSummary) {
    for node in map.values() {
        match node {
            Node::Null => summary.removals += 1,
            Node::Map(inner) if !inner.is_empty() => tally(inner, summary),
            _ => summary.assignments += 1,
        }
    }
}

/// Shape of a patch, for logs and status lines
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PatchSummary {
    /// Keys set to null
    pub removals: usize,
    /// Keys assigned a leaf or an empty map
    pub assignments: usize,
    /// Top-level links with at least one change
    pub touched_links: BTreeSet<String>,
}

impl PatchSummary {
    /// Total number of changed keys
    #[inline]
    #[must_use]
    pub fn changes(&self) -> usize {
        self.removals + self.assignments
    }
}
