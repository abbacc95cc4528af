//! Structural diff and patch application
//!
//! `apply_patch(a, &compute_diff(a, b)) == b` for any two well-formed trees,
//! and `compute_diff(t, t)` is always empty.

use crate::node::{strip_tombstones, MapNode, Node};
use crate::patch::Patch;
use crate::tree::ConfigTree;

/// Compute the minimal patch turning `baseline` into `working`
///
/// At every map level, over the union of keys:
/// - only in `baseline` → `null`
/// - only in `working` → the full subtree from `working`
/// - maps on both sides → recurse, omitted when nothing changed below
/// - anything else that differs → the value from `working`
#[must_use]
pub fn compute_diff(baseline: &ConfigTree, working: &ConfigTree) -> Patch {
    Patch::from_links(diff_maps(baseline.links(), working.links()))
}

fn diff_maps(old: &MapNode, new: &MapNode) -> MapNode {
    let mut out = MapNode::new();

    for (key, old_value) in old {
        match new.get(key) {
            None => {
                out.insert(key.clone(), Node::Null);
            }
            Some(new_value) => {
                if let Some(change) = diff_nodes(old_value, new_value) {
                    out.insert(key.clone(), change);
                }
            }
        }
    }

    for (key, new_value) in new {
        if !old.contains_key(key) {
            out.insert(key.clone(), new_value.clone());
        }
    }

    out
}

fn diff_nodes(old: &Node, new: &Node) -> Option<Node> {
    match (old, new) {
        (Node::Map(old_map), Node::Map(new_map)) => {
            let inner = diff_maps(old_map, new_map);
            (!inner.is_empty()).then_some(Node::Map(inner))
        }
        _ if old == new => None,
        _ => Some(new.clone()),
    }
}

/// Apply `patch` to `tree`, returning a new tree
///
/// `null` removes a key, a map over an existing map recurses, and any other
/// value is written as-is. Tombstones that address absent keys are ignored.
#[must_use]
pub fn apply_patch(tree: &ConfigTree, patch: &Patch) -> ConfigTree {
    let mut links = tree.links().clone();
    apply_map(&mut links, patch.links());
    ConfigTree::from_links_unchecked(links)
}

fn apply_map(target: &mut MapNode, patch: &MapNode) {
    for (key, change) in patch {
        match change {
            Node::Null => {
                target.remove(key);
            }
            Node::Map(inner) => match target.get_mut(key) {
                Some(Node::Map(existing)) => apply_map(existing, inner),
                _ => {
                    target.insert(key.clone(), Node::Map(strip_tombstones(inner)));
                }
            },
            Node::Leaf(_) => {
                target.insert(key.clone(), change.clone());
            }
        }
    }
}
