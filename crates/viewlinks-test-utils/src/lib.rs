//! Testing utilities for the viewlinks workspace
//!
//! Shared fixtures and proptest strategies.

#![allow(missing_docs)]

use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use viewlinks_tree::{
    ConfigTree, LeafValue, MapNode, Node, Patch, Path, ANALYZERS_KEY, FIELDS_KEY,
    INCLUDE_ALL_FIELDS_KEY, STORE_VALUES_KEY, TRACK_LIST_POSITIONS_KEY,
};

pub fn tree(value: JsonValue) -> ConfigTree {
    ConfigTree::from_value(value).unwrap()
}

pub fn path(s: &str) -> Path {
    viewlinks_tree::parse(s).unwrap()
}

pub fn node(value: JsonValue) -> Node {
    Node::try_from(value).unwrap()
}

pub fn patch(value: JsonValue) -> Patch {
    serde_json::from_value(value).unwrap()
}

/// A view with two links, one of them nested three levels deep
pub fn sample_view() -> ConfigTree {
    tree(json!({
        "links": {
            "products": {
                "includeAllFields": false,
                "storeValues": "none",
                "fields": {
                    "name": {
                        "analyzers": ["identity"],
                        "fields": {
                            "en": {"analyzers": ["text_en"]},
                            "de": {"analyzers": ["text_de"]}
                        }
                    },
                    "price": {}
                }
            },
            "reviews": {
                "includeAllFields": true,
                "trackListPositions": false
            }
        }
    }))
}

/// Short keys from a small alphabet so paths often collide with tree content,
/// plus some that need escaping
pub fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-c]{1,2}",
        1 => "[a-c.\\[\\]\\\\]{1,3}",
    ]
}

pub fn arb_leaf() -> impl Strategy<Value = LeafValue> {
    prop_oneof![
        any::<bool>().prop_map(LeafValue::Bool),
        any::<i64>().prop_map(|n| LeafValue::Number(n.into())),
        "[a-z]{0,6}".prop_map(LeafValue::String),
        prop::collection::vec("[a-z_]{1,8}", 0..3)
            .prop_map(|items| LeafValue::List(items.into_iter().map(LeafValue::String).collect())),
    ]
}

fn arb_property_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ANALYZERS_KEY),
        Just(INCLUDE_ALL_FIELDS_KEY),
        Just(TRACK_LIST_POSITIONS_KEY),
        Just(STORE_VALUES_KEY),
    ]
    .prop_map(str::to_string)
}

fn arb_properties() -> impl Strategy<Value = MapNode> {
    prop::collection::btree_map(arb_property_key(), arb_leaf().prop_map(Node::Leaf), 0..3)
}

/// A link or field definition, nested up to three levels
pub fn arb_definition() -> impl Strategy<Value = MapNode> {
    arb_properties().prop_recursive(3, 24, 3, |inner| {
        (
            arb_properties(),
            prop::collection::btree_map(arb_key(), inner, 0..3),
        )
            .prop_map(|(mut definition, fields)| {
                let fields = fields
                    .into_iter()
                    .map(|(name, field)| (name, Node::Map(field)))
                    .collect();
                definition.insert(FIELDS_KEY.to_string(), Node::Map(fields));
                definition
            })
    })
}

/// Well-formed tree without tombstones
pub fn arb_tree() -> impl Strategy<Value = ConfigTree> {
    prop::collection::btree_map(arb_key(), arb_definition(), 0..4).prop_map(|links| {
        ConfigTree::from_links_unchecked(
            links
                .into_iter()
                .map(|(name, definition)| (name, Node::Map(definition)))
                .collect(),
        )
    })
}

pub fn arb_path() -> impl Strategy<Value = Path> {
    (arb_key(), prop::collection::vec(arb_key(), 0..3))
        .prop_filter_map("keys are non-empty", |(link, fields)| {
            Path::from_names(link, fields).ok()
        })
}

/// Value that may be written at a path: a definition or a bare leaf
pub fn arb_value() -> impl Strategy<Value = Node> {
    prop_oneof![
        3 => arb_definition().prop_map(Node::Map),
        1 => arb_leaf().prop_map(Node::Leaf),
    ]
}
