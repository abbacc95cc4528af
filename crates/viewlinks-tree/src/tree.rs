//! The link configuration tree
//!
//! `links` → link definition → `fields` → field definition → `fields` → …

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::address;
use crate::hash::{ContentHash, HashError};
use crate::node::{LeafValue, MapNode, Node, NodeError};
use crate::path::{escape_key, Path, PathError, FIELDS_KEY};

/// Well-known link/field property: analyzer names
pub const ANALYZERS_KEY: &str = "analyzers";
/// Well-known link/field property: index all sub-attributes
pub const INCLUDE_ALL_FIELDS_KEY: &str = "includeAllFields";
/// Well-known link/field property: track array positions
pub const TRACK_LIST_POSITIONS_KEY: &str = "trackListPositions";
/// Well-known link property: stored value mode
pub const STORE_VALUES_KEY: &str = "storeValues";

/// Recursive link configuration of a search view
///
/// Serialized as `{"links": {...}}`. A live tree never contains
/// [`Node::Null`], and every link and field definition is a map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTree")]
pub struct ConfigTree {
    links: MapNode,
}

#[derive(Deserialize)]
struct RawTree {
    #[serde(default)]
    links: MapNode,
}

impl TryFrom<RawTree> for ConfigTree {
    type Error = TreeError;

    fn try_from(raw: RawTree) -> Result<Self, Self::Error> {
        Self::from_links(raw.links)
    }
}

impl ConfigTree {
    /// Empty tree (`{"links": {}}`)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a link map, validating shape
    ///
    /// # Errors
    /// Returns error if the map contains tombstones or non-map definitions
    pub fn from_links(links: MapNode) -> Result<Self, TreeError> {
        let tree = Self { links };
        tree.validate()?;
        Ok(tree)
    }

    /// Build without validation
    ///
    /// Used by copy-on-write operations whose inputs are already trees.
    #[inline]
    #[must_use]
    pub fn from_links_unchecked(links: MapNode) -> Self {
        Self { links }
    }

    /// Parse from a JSON value shaped `{"links": {...}}`
    ///
    /// # Errors
    /// Returns error if the value is not a well-formed tree
    pub fn from_value(value: JsonValue) -> Result<Self, TreeError> {
        serde_json::from_value(value).map_err(TreeError::InvalidJson)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or not a well-formed tree
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        serde_json::from_str(json).map_err(TreeError::InvalidJson)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or not a well-formed tree
    pub fn from_yaml(yaml: &str) -> Result<Self, TreeError> {
        serde_yaml::from_str(yaml).map_err(TreeError::InvalidYaml)
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String, TreeError> {
        serde_json::to_string_pretty(self).map_err(TreeError::InvalidJson)
    }

    /// Convert to a JSON value
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        serde_json::json!({ "links": Node::to_json_value(&Node::Map(self.links.clone())) })
    }

    /// The link map
    #[inline]
    #[must_use]
    pub fn links(&self) -> &MapNode {
        &self.links
    }

    /// Consume into the link map
    #[inline]
    #[must_use]
    pub fn into_links(self) -> MapNode {
        self.links
    }

    /// Check if there are no links
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Names of all links, sorted
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// Check if a link exists
    #[inline]
    #[must_use]
    pub fn contains_link(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    /// Typed view of a link definition
    #[must_use]
    pub fn link(&self, name: &str) -> Option<DefinitionView<'_>> {
        self.links
            .get(name)
            .and_then(Node::as_map)
            .map(DefinitionView::new)
    }

    /// Typed view of the definition at `path`
    ///
    /// # Errors
    /// Returns error on traversal through a non-map node
    pub fn definition(&self, path: &Path) -> Result<Option<DefinitionView<'_>>, PathError> {
        Ok(address::get(self, path)?
            .and_then(Node::as_map)
            .map(DefinitionView::new))
    }

    /// Total number of field definitions at every depth
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.links
            .values()
            .filter_map(Node::as_map)
            .map(|link| DefinitionView::new(link).descendant_count())
            .sum()
    }

    /// Node at `path` (see [`address::get`])
    ///
    /// # Errors
    /// Returns error on traversal through a non-map node
    #[inline]
    pub fn get(&self, path: &Path) -> Result<Option<&Node>, PathError> {
        address::get(self, path)
    }

    /// Copy with `value` placed at `path` (see [`address::set`])
    ///
    /// # Errors
    /// Returns error on traversal through a non-map node
    #[inline]
    pub fn set(&self, path: &Path, value: Node) -> Result<Self, PathError> {
        address::set(self, path, value)
    }

    /// Content hash of the canonical JSON encoding
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn content_hash(&self) -> Result<ContentHash, HashError> {
        ContentHash::compute_serializable(self)
    }

    /// Check tree invariants
    ///
    /// # Errors
    /// - [`TreeError::NullInTree`] if a tombstone is present
    /// - [`TreeError::NotAContainer`] if a definition or `fields` entry is not a map
    pub fn validate(&self) -> Result<(), TreeError> {
        for (name, link) in &self.links {
            validate_definition(&format!("links[{}]", escape_key(name)), link)?;
        }
        Ok(())
    }
}

fn validate_definition(location: &str, node: &Node) -> Result<(), TreeError> {
    let Some(definition) = node.as_map() else {
        return Err(if node.is_null() {
            TreeError::null_in_tree(location)
        } else {
            TreeError::not_a_container(location, node.kind_name())
        });
    };

    for (key, value) in definition {
        if key == FIELDS_KEY {
            let fields_location = format!("{location}.{FIELDS_KEY}");
            let Some(fields) = value.as_map() else {
                return Err(if value.is_null() {
                    TreeError::null_in_tree(fields_location)
                } else {
                    TreeError::not_a_container(fields_location, value.kind_name())
                });
            };
            for (name, field) in fields {
                validate_definition(
                    &format!("{location}.{FIELDS_KEY}[{}]", escape_key(name)),
                    field,
                )?;
            }
        } else if value.contains_null() {
            return Err(TreeError::null_in_tree(format!("{location}/{key}")));
        }
    }
    Ok(())
}

/// Read-only typed view of a link or field definition
#[derive(Debug, Clone, Copy)]
pub struct DefinitionView<'a> {
    map: &'a MapNode,
}

impl<'a> DefinitionView<'a> {
    /// Wrap a definition map
    #[inline]
    #[must_use]
    pub fn new(map: &'a MapNode) -> Self {
        Self { map }
    }

    /// Underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &'a MapNode {
        self.map
    }

    /// Raw property lookup
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&'a Node> {
        self.map.get(key)
    }

    /// Analyzer names, if set
    #[must_use]
    pub fn analyzers(&self) -> Option<Vec<&'a str>> {
        match self.map.get(ANALYZERS_KEY)?.as_leaf()? {
            LeafValue::List(items) => items.iter().map(LeafValue::as_str).collect(),
            LeafValue::String(single) => Some(vec![single.as_str()]),
            _ => None,
        }
    }

    /// `includeAllFields`, if set
    #[must_use]
    pub fn include_all_fields(&self) -> Option<bool> {
        self.bool_property(INCLUDE_ALL_FIELDS_KEY)
    }

    /// `trackListPositions`, if set
    #[must_use]
    pub fn track_list_positions(&self) -> Option<bool> {
        self.bool_property(TRACK_LIST_POSITIONS_KEY)
    }

    /// `storeValues`, if set
    #[must_use]
    pub fn store_values(&self) -> Option<&'a str> {
        self.map.get(STORE_VALUES_KEY)?.as_leaf()?.as_str()
    }

    /// Directly nested field definitions
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, DefinitionView<'a>)> {
        self.map
            .get(FIELDS_KEY)
            .and_then(Node::as_map)
            .into_iter()
            .flat_map(|fields| fields.iter())
            .filter_map(|(name, node)| node.as_map().map(|m| (name.as_str(), Self::new(m))))
    }

    /// A directly nested field definition
    #[must_use]
    pub fn field(&self, name: &str) -> Option<DefinitionView<'a>> {
        self.map
            .get(FIELDS_KEY)?
            .as_map()?
            .get(name)?
            .as_map()
            .map(Self::new)
    }

    /// Number of field definitions below this one, at any depth
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.fields()
            .map(|(_, field)| 1 + field.descendant_count())
            .sum()
    }

    fn bool_property(&self, key: &str) -> Option<bool> {
        self.map.get(key)?.as_leaf()?.as_bool()
    }
}

/// Errors constructing or (de)serializing trees
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Tombstone inside a live tree
    #[error("null is only valid inside a patch (at {location})")]
    NullInTree { location: String },

    /// Definition or `fields` entry that is not a map
    #[error("expected a map at {location}, found {found}")]
    NotAContainer {
        location: String,
        found: &'static str,
    },

    /// Value that cannot be represented as a node
    #[error("unsupported value: {0}")]
    Node(#[from] NodeError),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[source] serde_yaml::Error),
}

impl TreeError {
    /// Create tombstone error
    pub fn null_in_tree(location: impl Into<String>) -> Self {
        Self::NullInTree {
            location: location.into(),
        }
    }

    /// Create shape error
    pub fn not_a_container(location: impl Into<String>, found: &'static str) -> Self {
        Self::NotAContainer {
            location: location.into(),
            found,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse;
    use serde_json::json;

    #[test]
    fn parse_and_serialize_roundtrip() {
        let value = json!({"links": {"products": {
            "analyzers": ["identity", "text_en"],
            "includeAllFields": true,
            "fields": {"name": {"analyzers": ["text_en"]}}
        }}});
        let tree = ConfigTree::from_value(value.clone()).unwrap();
        assert_eq!(tree.to_value(), value);
        assert_eq!(serde_json::to_value(&tree).unwrap(), value);
    }

    #[test]
    fn missing_links_key_is_empty_tree() {
        let tree = ConfigTree::from_json("{}").unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn null_link_rejected() {
        let result = ConfigTree::from_value(json!({"links": {"c": null}}));
        assert!(matches!(result, Err(TreeError::InvalidJson(_))));

        let mut links = MapNode::new();
        links.insert("c".into(), Node::Null);
        assert!(matches!(
            ConfigTree::from_links(links),
            Err(TreeError::NullInTree { .. })
        ));
    }

    #[test]
    fn leaf_link_rejected() {
        let mut links = MapNode::new();
        links.insert("c".into(), Node::from(true));
        match ConfigTree::from_links(links) {
            Err(TreeError::NotAContainer { location, found }) => {
                assert_eq!(location, "links[c]");
                assert_eq!(found, "boolean");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn nested_leaf_field_rejected() {
        let mut links = MapNode::new();
        let field_map: MapNode = [("f".to_string(), Node::from(1_i64))].into_iter().collect();
        let link: MapNode = [("fields".to_string(), Node::Map(field_map))].into_iter().collect();
        links.insert("c".into(), Node::Map(link));
        let err = ConfigTree::from_links(links).unwrap_err();
        assert!(err.to_string().contains("links[c].fields[f]"));
    }

    #[test]
    fn yaml_input_supported() {
        let yaml = "links:\n  products:\n    includeAllFields: true\n    fields:\n      name: {}\n";
        let tree = ConfigTree::from_yaml(yaml).unwrap();
        assert_eq!(tree.field_count(), 1);
        assert_eq!(tree.link("products").unwrap().include_all_fields(), Some(true));
    }

    #[test]
    fn definition_view_accessors() {
        let tree = ConfigTree::from_value(json!({"links": {"c": {
            "analyzers": ["identity"],
            "storeValues": "id",
            "trackListPositions": false,
            "fields": {"a": {"fields": {"b": {}}}, "z": {}}
        }}}))
        .unwrap();
        let link = tree.link("c").unwrap();
        assert_eq!(link.analyzers(), Some(vec!["identity"]));
        assert_eq!(link.store_values(), Some("id"));
        assert_eq!(link.track_list_positions(), Some(false));
        assert_eq!(link.fields().map(|(n, _)| n).collect::<Vec<_>>(), vec!["a", "z"]);
        assert_eq!(link.descendant_count(), 3);
        assert!(link.field("a").unwrap().field("b").is_some());

        let nested = tree.definition(&parse("links[c].fields[a]").unwrap()).unwrap();
        assert_eq!(nested.unwrap().descendant_count(), 1);
    }

    #[test]
    fn content_hash_ignores_construction_order() {
        let a = ConfigTree::from_value(json!({"links": {"x": {}, "y": {"k": 1}}})).unwrap();
        let b = ConfigTree::from_value(json!({"links": {"y": {"k": 1}, "x": {}}})).unwrap();
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }
}
