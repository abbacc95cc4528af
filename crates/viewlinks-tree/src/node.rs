//! Tree nodes
//!
//! A [`Node`] is either a scalar [`LeafValue`], a [`MapNode`] of named
//! children, or the [`Node::Null`] tombstone. Tombstones only appear inside a
//! [`Patch`](crate::Patch); live trees reject them.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value as JsonValue};

/// Mapping from key to child node
///
/// Ordered so that serialization and hashing are canonical.
pub type MapNode = BTreeMap<String, Node>;

/// Scalar value stored at a non-structural key
///
/// Lists of scalars (e.g. a link's `analyzers`) are opaque leaves: they are
/// compared by value and replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LeafValue {
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<LeafValue>),
}

impl LeafValue {
    /// Type name used in diagnostics
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
        }
    }

    /// String content, if this is a string leaf
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean leaf
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Node of a configuration tree or patch
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Removal marker, valid only inside a patch
    Null,
    /// Scalar value
    Leaf(LeafValue),
    /// Nested map
    Map(MapNode),
}

impl Node {
    /// An empty map node
    #[inline]
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map(MapNode::new())
    }

    /// Check for the removal marker
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check for a map node
    #[inline]
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Borrow as map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow as map
    #[inline]
    pub fn as_map_mut(&mut self) -> Option<&mut MapNode> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as leaf
    #[inline]
    #[must_use]
    pub fn as_leaf(&self) -> Option<&LeafValue> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Type name used in diagnostics
    #[inline]
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Leaf(leaf) => leaf.kind_name(),
            Self::Map(_) => "map",
        }
    }

    /// Check whether a tombstone occurs anywhere in this subtree
    #[must_use]
    pub fn contains_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Leaf(_) => false,
            Self::Map(map) => map.values().any(Node::contains_null),
        }
    }

    /// Copy of this subtree with every tombstone entry dropped
    #[must_use]
    pub fn without_tombstones(&self) -> Self {
        match self {
            Self::Map(map) => Self::Map(strip_tombstones(map)),
            other => other.clone(),
        }
    }

    /// Convert to a JSON value
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Leaf(leaf) => leaf_to_json(leaf),
            Self::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }
}

pub(crate) fn strip_tombstones(map: &MapNode) -> MapNode {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.without_tombstones()))
        .collect()
}

fn leaf_to_json(leaf: &LeafValue) -> JsonValue {
    match leaf {
        LeafValue::Bool(b) => JsonValue::Bool(*b),
        LeafValue::Number(n) => JsonValue::Number(n.clone()),
        LeafValue::String(s) => JsonValue::String(s.clone()),
        LeafValue::List(items) => JsonValue::Array(items.iter().map(leaf_to_json).collect()),
    }
}

fn json_to_leaf(value: JsonValue) -> Result<LeafValue, NodeError> {
    match value {
        JsonValue::Bool(b) => Ok(LeafValue::Bool(b)),
        JsonValue::Number(n) => Ok(LeafValue::Number(n)),
        JsonValue::String(s) => Ok(LeafValue::String(s)),
        JsonValue::Array(items) => items
            .into_iter()
            .map(json_to_leaf)
            .collect::<Result<Vec<_>, _>>()
            .map(LeafValue::List),
        JsonValue::Null => Err(NodeError::UnsupportedListItem { found: "null" }),
        JsonValue::Object(_) => Err(NodeError::UnsupportedListItem { found: "map" }),
    }
}

impl TryFrom<JsonValue> for Node {
    type Error = NodeError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Object(object) => object
                .into_iter()
                .map(|(k, v)| Node::try_from(v).map(|node| (k, node)))
                .collect::<Result<MapNode, _>>()
                .map(Self::Map),
            scalar => json_to_leaf(scalar).map(Self::Leaf),
        }
    }
}

impl From<&Node> for JsonValue {
    fn from(node: &Node) -> Self {
        node.to_json_value()
    }
}

impl From<LeafValue> for Node {
    fn from(leaf: LeafValue) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<MapNode> for Node {
    fn from(map: MapNode) -> Self {
        Self::Map(map)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Leaf(LeafValue::Bool(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::Leaf(LeafValue::String(value.to_string()))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::Leaf(LeafValue::String(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Self::Leaf(LeafValue::Number(value.into()))
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_value())
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Leaf(leaf) => leaf.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Node::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Errors converting foreign values into nodes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// Lists may only hold scalars or nested scalar lists
    #[error("lists may only contain scalar values, found {found}")]
    UnsupportedListItem { found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_from_json_object() {
        let node = Node::try_from(json!({"a": {"b": true}, "c": "x"})).unwrap();
        let map = node.as_map().unwrap();
        assert!(map["a"].is_map());
        assert_eq!(map["c"], Node::from("x"));
    }

    #[test]
    fn node_from_json_null_is_tombstone() {
        let node = Node::try_from(json!(null)).unwrap();
        assert!(node.is_null());
    }

    #[test]
    fn scalar_list_is_leaf() {
        let node = Node::try_from(json!(["identity", "text_en"])).unwrap();
        assert_eq!(node.kind_name(), "list");
    }

    #[test]
    fn list_with_object_is_rejected() {
        let result = Node::try_from(json!([{"a": 1}]));
        assert_eq!(result, Err(NodeError::UnsupportedListItem { found: "map" }));
    }

    #[test]
    fn without_tombstones_drops_nested_nulls() {
        let node = Node::try_from(json!({"a": null, "b": {"c": null, "d": 1}})).unwrap();
        let clean = node.without_tombstones();
        assert_eq!(clean.to_json_value(), json!({"b": {"d": 1}}));
        assert!(!clean.contains_null());
        assert!(node.contains_null());
    }

    #[test]
    fn serde_json_roundtrip_keeps_shape() {
        let value = json!({"analyzers": ["identity"], "includeAllFields": false, "n": 3});
        let node: Node = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }
}
