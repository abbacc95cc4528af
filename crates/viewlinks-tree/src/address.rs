//! Get/set/delete at an arbitrary depth of a [`ConfigTree`]
//!
//! All writes are copy-on-write: the input tree is never mutated.

use crate::node::{MapNode, Node};
use crate::path::{Path, PathError, FIELDS_KEY};
use crate::tree::ConfigTree;

/// Look up the node addressed by `path`
///
/// Returns `Ok(None)` when any segment along the way is absent.
///
/// # Errors
/// Returns [`PathError::NotAContainer`] if an intermediate definition or its
/// `fields` entry is not a map
pub fn get<'a>(tree: &'a ConfigTree, path: &Path) -> Result<Option<&'a Node>, PathError> {
    let (first, rest) = split_first(path);
    let Some(mut current) = tree.links().get(first) else {
        return Ok(None);
    };

    for (depth, segment) in rest.iter().enumerate() {
        let Some(definition) = current.as_map() else {
            return Err(PathError::not_a_container(
                path.truncated(depth + 1).to_string(),
                current.kind_name(),
            ));
        };
        let Some(fields) = definition.get(FIELDS_KEY) else {
            return Ok(None);
        };
        let Some(fields) = fields.as_map() else {
            return Err(fields_not_a_container(path, depth, fields));
        };
        let Some(next) = fields.get(segment.key()) else {
            return Ok(None);
        };
        current = next;
    }

    Ok(Some(current))
}

/// Place `value` at `path`, returning a new tree
///
/// Missing intermediate definitions and `fields` maps are created. Setting
/// [`Node::Null`] removes the final key from its parent map; the parent is
/// kept even if that leaves it empty, and absent intermediates are not
/// created for a removal.
///
/// # Errors
/// Returns [`PathError::NotAContainer`] if traversal hits a non-map node
pub fn set(tree: &ConfigTree, path: &Path, value: Node) -> Result<ConfigTree, PathError> {
    let create = !value.is_null();
    let mut links = tree.links().clone();
    with_parent(&mut links, path, create, |container, key| {
        if value.is_null() {
            container.remove(key);
        } else {
            container.insert(key.to_string(), value);
        }
        Ok(())
    })?;
    Ok(ConfigTree::from_links_unchecked(links))
}

/// Look up a non-structural property of the definition at `path`
///
/// # Errors
/// Returns [`PathError`] on traversal through a non-map node
pub fn get_property<'a>(
    tree: &'a ConfigTree,
    path: &Path,
    key: &str,
) -> Result<Option<&'a Node>, PathError> {
    Ok(get(tree, path)?
        .and_then(Node::as_map)
        .and_then(|definition| definition.get(key)))
}

/// Set (or with [`Node::Null`], remove) a property of the definition at `path`
///
/// The definition is created when absent, except for removals.
///
/// # Errors
/// - [`PathError::ReservedKey`] if `key` is `fields` or empty
/// - [`PathError::NotAContainer`] if the definition is not a map
pub fn set_property(
    tree: &ConfigTree,
    path: &Path,
    key: &str,
    value: Node,
) -> Result<ConfigTree, PathError> {
    if key.is_empty() || key == FIELDS_KEY {
        return Err(PathError::ReservedKey(key.to_string()));
    }

    let create = !value.is_null();
    let mut links = tree.links().clone();
    with_parent(&mut links, path, create, |container, last| {
        if !create && !container.contains_key(last) {
            return Ok(());
        }
        let definition = container
            .entry(last.to_string())
            .or_insert_with(Node::empty_map);
        let found = definition.kind_name();
        let Node::Map(definition) = definition else {
            return Err(PathError::not_a_container(path.to_string(), found));
        };
        if value.is_null() {
            definition.remove(key);
        } else {
            definition.insert(key.to_string(), value);
        }
        Ok(())
    })?;
    Ok(ConfigTree::from_links_unchecked(links))
}

/// Drop the `fields` entry of the definition at `path` if it is an empty map
///
/// Leaves the tree unchanged in every other case.
///
/// # Errors
/// Returns [`PathError`] on traversal through a non-map node
pub fn prune_empty_fields(tree: &ConfigTree, path: &Path) -> Result<ConfigTree, PathError> {
    let empty = get(tree, path)?
        .and_then(Node::as_map)
        .and_then(|definition| definition.get(FIELDS_KEY))
        .and_then(Node::as_map)
        .is_some_and(MapNode::is_empty);
    if !empty {
        return Ok(tree.clone());
    }

    let mut links = tree.links().clone();
    with_parent(&mut links, path, false, |container, last| {
        if let Some(Node::Map(definition)) = container.get_mut(last) {
            definition.remove(FIELDS_KEY);
        }
        Ok(())
    })?;
    Ok(ConfigTree::from_links_unchecked(links))
}

fn split_first(path: &Path) -> (&str, &[crate::path::Segment]) {
    let segments = path.segments();
    (segments[0].key(), &segments[1..])
}

fn fields_not_a_container(path: &Path, depth: usize, fields: &Node) -> PathError {
    PathError::not_a_container(
        format!("{}.{FIELDS_KEY}", path.truncated(depth + 1)),
        fields.kind_name(),
    )
}

/// Walk to the map that holds the last segment's key and hand it to `edit`
///
/// With `create` unset, a missing step ends the walk without calling `edit`.
fn with_parent<F>(links: &mut MapNode, path: &Path, create: bool, edit: F) -> Result<(), PathError>
where
    F: FnOnce(&mut MapNode, &str) -> Result<(), PathError>,
{
    let segments = path.segments();
    let (last, ancestors) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut container = links;
    for (depth, segment) in ancestors.iter().enumerate() {
        if !create && !container.contains_key(segment.key()) {
            return Ok(());
        }
        let definition = container
            .entry(segment.key().to_string())
            .or_insert_with(Node::empty_map);
        let found = definition.kind_name();
        let Node::Map(definition) = definition else {
            return Err(PathError::not_a_container(
                path.truncated(depth + 1).to_string(),
                found,
            ));
        };

        if !create && !definition.contains_key(FIELDS_KEY) {
            return Ok(());
        }
        let fields = definition
            .entry(FIELDS_KEY.to_string())
            .or_insert_with(Node::empty_map);
        let found = fields.kind_name();
        let Node::Map(fields) = fields else {
            return Err(PathError::not_a_container(
                format!("{}.{FIELDS_KEY}", path.truncated(depth + 1)),
                found,
            ));
        };
        container = fields;
    }

    edit(container, last.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse;
    use serde_json::json;

    fn tree(value: serde_json::Value) -> ConfigTree {
        ConfigTree::from_value(value).unwrap()
    }

    #[test]
    fn get_existing_nested_field() {
        let t = tree(json!({"links": {"c": {"fields": {"f": {"analyzers": ["identity"]}}}}}));
        let node = get(&t, &parse("links[c].fields[f]").unwrap()).unwrap().unwrap();
        assert!(node.as_map().unwrap().contains_key("analyzers"));
    }

    #[test]
    fn get_missing_intermediate_is_none() {
        let t = tree(json!({"links": {"c": {}}}));
        assert_eq!(get(&t, &parse("links[c].fields[f].fields[g]").unwrap()).unwrap(), None);
        assert_eq!(get(&t, &parse("links[x]").unwrap()).unwrap(), None);
    }

    #[test]
    fn get_through_leaf_fails() {
        let t = ConfigTree::from_links_unchecked(
            [("c".to_string(), Node::from(true))].into_iter().collect(),
        );
        let result = get(&t, &parse("links[c].fields[f]").unwrap());
        assert!(matches!(result, Err(PathError::NotAContainer { found: "boolean", .. })));
    }

    #[test]
    fn set_creates_intermediates() {
        let t = ConfigTree::new();
        let path = parse("links[c].fields[a].fields[b]").unwrap();
        let updated = set(&t, &path, Node::empty_map()).unwrap();
        assert_eq!(
            updated.to_value(),
            json!({"links": {"c": {"fields": {"a": {"fields": {"b": {}}}}}}})
        );
        assert!(t.is_empty());
    }

    #[test]
    fn set_null_removes_only_target() {
        let t = tree(json!({"links": {"c": {"fields": {"f": {}, "g": {}}}}}));
        let updated = set(&t, &parse("links[c].fields[f]").unwrap(), Node::Null).unwrap();
        assert_eq!(updated.to_value(), json!({"links": {"c": {"fields": {"g": {}}}}}));
    }

    #[test]
    fn set_null_keeps_emptied_parent() {
        let t = tree(json!({"links": {"c": {"fields": {"f": {}}}}}));
        let updated = set(&t, &parse("links[c].fields[f]").unwrap(), Node::Null).unwrap();
        assert_eq!(updated.to_value(), json!({"links": {"c": {"fields": {}}}}));
    }

    #[test]
    fn set_null_on_missing_path_is_noop() {
        let t = tree(json!({"links": {"c": {}}}));
        let updated = set(&t, &parse("links[c].fields[f].fields[g]").unwrap(), Node::Null).unwrap();
        assert_eq!(updated, t);
    }

    #[test]
    fn set_through_leaf_fields_fails() {
        let t = ConfigTree::from_links_unchecked(
            [(
                "c".to_string(),
                Node::Map([("fields".to_string(), Node::from("oops"))].into_iter().collect()),
            )]
            .into_iter()
            .collect(),
        );
        let result = set(&t, &parse("links[c].fields[f]").unwrap(), Node::empty_map());
        match result {
            Err(PathError::NotAContainer { path, found }) => {
                assert_eq!(path, "links[c].fields");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn set_property_and_remove() {
        let t = tree(json!({"links": {"c": {}}}));
        let path = parse("links[c]").unwrap();
        let updated = set_property(&t, &path, "includeAllFields", Node::from(true)).unwrap();
        assert_eq!(
            get_property(&updated, &path, "includeAllFields").unwrap(),
            Some(&Node::from(true))
        );
        let removed = set_property(&updated, &path, "includeAllFields", Node::Null).unwrap();
        assert_eq!(removed, t);
    }

    #[test]
    fn set_property_rejects_fields_key() {
        let t = tree(json!({"links": {"c": {}}}));
        let result = set_property(&t, &parse("links[c]").unwrap(), "fields", Node::empty_map());
        assert_eq!(result, Err(PathError::ReservedKey("fields".into())));
    }

    #[test]
    fn prune_only_empty_fields() {
        let t = tree(json!({"links": {"c": {"fields": {}}, "d": {"fields": {"x": {}}}}}));
        let pruned = prune_empty_fields(&t, &parse("links[c]").unwrap()).unwrap();
        assert_eq!(pruned.to_value(), json!({"links": {"c": {}, "d": {"fields": {"x": {}}}}}));
        let untouched = prune_empty_fields(&t, &parse("links[d]").unwrap()).unwrap();
        assert_eq!(untouched, t);
    }
}
