//! Post-edit normalization
//!
//! A [`Normalize`] implementation sees the tree produced by a primitive edit
//! together with that edit and the current baseline, and returns the tree to
//! commit. It must be pure and total over well-formed trees.

use serde::{Deserialize, Serialize};
use tracing::trace;
use viewlinks_tree::{address, ConfigTree, MapNode, Node, Path, FIELDS_KEY};

use crate::action::Action;

/// Normalization hook run after every `SetField`/`SetProperty`
pub trait Normalize {
    /// Produce the tree to commit
    fn normalize(&self, tree: ConfigTree, action: &Action, baseline: &ConfigTree) -> ConfigTree;
}

impl<F> Normalize for F
where
    F: Fn(ConfigTree, &Action, &ConfigTree) -> ConfigTree,
{
    fn normalize(&self, tree: ConfigTree, action: &Action, baseline: &ConfigTree) -> ConfigTree {
        self(tree, action, baseline)
    }
}

/// Commit trees exactly as edited
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Normalize for Identity {
    fn normalize(&self, tree: ConfigTree, _action: &Action, _baseline: &ConfigTree) -> ConfigTree {
        tree
    }
}

/// Configurable default normalization
///
/// - `empty_string_deletes`: writing `""` removes the key instead
/// - `prune_empty_fields`: after a removal, drop the parent definition's
///   `fields` map if it became empty, unless the baseline holds an empty
///   `fields` map there too. Definitions themselves are never pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizePolicy {
    pub prune_empty_fields: bool,
    pub empty_string_deletes: bool,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            prune_empty_fields: true,
            empty_string_deletes: true,
        }
    }
}

impl NormalizePolicy {
    /// Policy that changes nothing
    #[inline]
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            prune_empty_fields: false,
            empty_string_deletes: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_prune_empty_fields(mut self, enabled: bool) -> Self {
        self.prune_empty_fields = enabled;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_empty_string_deletes(mut self, enabled: bool) -> Self {
        self.empty_string_deletes = enabled;
        self
    }

    fn coerce_empty_string(&self, tree: ConfigTree, action: &Action) -> (ConfigTree, bool) {
        if !self.empty_string_deletes {
            return (tree, false);
        }
        let result = match action {
            Action::SetField { path, value } if is_empty_string(value) => {
                address::set(&tree, path, Node::Null)
            }
            Action::SetProperty { path, key, value } if is_empty_string(value) => {
                address::set_property(&tree, path, key, Node::Null)
            }
            _ => return (tree, false),
        };
        match result {
            Ok(coerced) => {
                trace!(action = action.name(), "empty string coerced to removal");
                (coerced, true)
            }
            Err(_) => (tree, false),
        }
    }

    fn prune(&self, tree: ConfigTree, path: &Path, baseline: &ConfigTree) -> ConfigTree {
        let Some(parent) = path.parent() else {
            return tree;
        };
        if holds_empty_fields(baseline, &parent) {
            return tree;
        }
        match address::prune_empty_fields(&tree, &parent) {
            Ok(pruned) => pruned,
            Err(_) => tree,
        }
    }
}

impl Normalize for NormalizePolicy {
    fn normalize(&self, tree: ConfigTree, action: &Action, baseline: &ConfigTree) -> ConfigTree {
        let (tree, coerced) = self.coerce_empty_string(tree, action);

        let removed_field = matches!(action, Action::SetField { .. })
            && (coerced || action.is_removal());
        match action.target() {
            Some(path) if self.prune_empty_fields && removed_field => {
                self.prune(tree, path, baseline)
            }
            _ => tree,
        }
    }
}

fn holds_empty_fields(tree: &ConfigTree, definition: &Path) -> bool {
    matches!(address::get(tree, definition), Ok(Some(node)) if node
        .as_map()
        .and_then(|map| map.get(FIELDS_KEY))
        .and_then(Node::as_map)
        .is_some_and(MapNode::is_empty))
}

fn is_empty_string(node: &Node) -> bool {
    node.as_leaf()
        .and_then(|leaf| leaf.as_str())
        .is_some_and(str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> ConfigTree {
        ConfigTree::from_value(value).unwrap()
    }

    fn path(s: &str) -> Path {
        viewlinks_tree::parse(s).unwrap()
    }

    fn apply(policy: NormalizePolicy, before: &ConfigTree, action: &Action) -> ConfigTree {
        let edited = match action {
            Action::SetField { path, value } => address::set(before, path, value.clone()),
            Action::SetProperty { path, key, value } => {
                address::set_property(before, path, key, value.clone())
            }
            _ => Ok(before.clone()),
        }
        .unwrap();
        policy.normalize(edited, action, before)
    }

    #[test]
    fn removing_last_field_prunes_container() {
        let before = tree(json!({"links": {"c": {"fields": {"f": {}}}}}));
        let action = Action::set_field(path("links[c].fields[f]"), Node::Null);
        let after = apply(NormalizePolicy::default(), &before, &action);
        assert_eq!(after.to_value(), json!({"links": {"c": {}}}));
    }

    #[test]
    fn pruning_disabled_keeps_empty_container() {
        let before = tree(json!({"links": {"c": {"fields": {"f": {}}}}}));
        let action = Action::set_field(path("links[c].fields[f]"), Node::Null);
        let policy = NormalizePolicy::default().with_prune_empty_fields(false);
        let after = apply(policy, &before, &action);
        assert_eq!(after.to_value(), json!({"links": {"c": {"fields": {}}}}));
    }

    #[test]
    fn sibling_keeps_container_alive() {
        let before = tree(json!({"links": {"c": {"fields": {"f": {}, "g": {}}}}}));
        let action = Action::set_field(path("links[c].fields[f]"), Node::Null);
        let after = apply(NormalizePolicy::default(), &before, &action);
        assert_eq!(after.to_value(), json!({"links": {"c": {"fields": {"g": {}}}}}));
    }

    #[test]
    fn empty_container_from_baseline_is_kept() {
        let baseline = tree(json!({"links": {"c": {"fields": {}}}}));
        let edited = tree(json!({"links": {"c": {"fields": {}}}}));
        let action = Action::set_field(path("links[c].fields[f]"), Node::Null);
        let after = NormalizePolicy::default().normalize(edited, &action, &baseline);
        assert_eq!(after, baseline);
    }

    #[test]
    fn emptied_link_is_not_pruned() {
        let before = tree(json!({"links": {"c": {"includeAllFields": true}}}));
        let action = Action::set_property(path("links[c]"), "includeAllFields", Node::Null);
        let after = apply(NormalizePolicy::default(), &before, &action);
        assert_eq!(after.to_value(), json!({"links": {"c": {}}}));
    }

    #[test]
    fn empty_string_property_is_deleted() {
        let before = tree(json!({"links": {"c": {"storeValues": "id"}}}));
        let action = Action::set_property(path("links[c]"), "storeValues", "");
        let after = apply(NormalizePolicy::default(), &before, &action);
        assert_eq!(after.to_value(), json!({"links": {"c": {}}}));

        let kept = apply(NormalizePolicy::disabled(), &before, &action);
        assert_eq!(kept.to_value(), json!({"links": {"c": {"storeValues": ""}}}));
    }

    #[test]
    fn closures_normalize() {
        let drop_everything = |_: ConfigTree, _: &Action, _: &ConfigTree| ConfigTree::new();
        let result = drop_everything.normalize(
            tree(json!({"links": {"c": {}}})),
            &Action::add_link("x"),
            &ConfigTree::new(),
        );
        assert!(result.is_empty());
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: NormalizePolicy =
            serde_json::from_value(json!({"prune_empty_fields": false})).unwrap();
        assert!(!policy.prune_empty_fields);
        assert!(policy.empty_string_deletes);
    }
}
