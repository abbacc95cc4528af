use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use viewlinks_form::{decompose_route, recompose, Action, FormReducer, Identity};
use viewlinks_test_utils::{arb_key, arb_path, arb_tree, path, sample_view, tree};
use viewlinks_tree::{apply_patch, compute_diff, parse, Node};

#[test]
fn sibling_isolation() {
    let mut form = FormReducer::new(tree(json!({"links": {"c": {"fields": {"f": {}, "g": {}}}}})));
    form.dispatch(Action::set_field(path("links[c].fields[f]"), Node::Null))
        .unwrap();
    assert_eq!(
        form.working_copy().to_value(),
        json!({"links": {"c": {"fields": {"g": {}}}}})
    );
}

#[test]
fn add_then_remove_link_cancels_out() {
    let mut form = FormReducer::new(tree(json!({"links": {}})));
    form.dispatch(Action::add_link("coll1")).unwrap();
    form.dispatch(Action::remove_link("coll1")).unwrap();
    assert_eq!(form.working_copy(), form.baseline());
    assert!(!form.is_dirty());
    assert!(form.pending_patch().is_empty());
}

#[test]
fn navigation_round_trip() {
    let p = decompose_route(&["coll1", "name", "sub"]).unwrap();
    assert_eq!(p, parse("links[coll1].fields[name].fields[sub]").unwrap());
    assert_eq!(recompose(&p), vec!["coll1", "name", "sub"]);
}

#[test]
fn end_to_end_scenario() {
    let mut form = FormReducer::new(tree(json!({"links": {}})));

    form.dispatch(Action::add_link("coll1")).unwrap();
    assert_eq!(form.working_copy().to_value(), json!({"links": {"coll1": {}}}));

    form.dispatch(Action::set_field(
        path("links[coll1].fields[name]"),
        Node::empty_map(),
    ))
    .unwrap();
    assert_eq!(
        form.working_copy().to_value(),
        json!({"links": {"coll1": {"fields": {"name": {}}}}})
    );

    let patch = compute_diff(form.baseline(), form.working_copy());
    assert_eq!(
        patch.to_value(),
        json!({"links": {"coll1": {"fields": {"name": {}}}}})
    );
}

#[test]
fn editing_a_loaded_view() {
    let mut form = FormReducer::new(sample_view());
    let name = path("links[products].fields[name]");

    form.dispatch_all([
        Action::remove_field(name.child("de").unwrap()),
        Action::add_field(name.clone(), "fr"),
        Action::set_property(
            name.child("fr").unwrap(),
            "analyzers",
            Node::try_from(json!(["text_fr"])).unwrap(),
        ),
        Action::set_property(path("links[products]"), "storeValues", ""),
    ])
    .unwrap();

    let patch = form.pending_patch();
    assert_eq!(
        patch.to_value(),
        json!({
            "links": {"products": {
                "storeValues": null,
                "fields": {"name": {"fields": {
                    "de": null,
                    "fr": {"analyzers": ["text_fr"]}
                }}}
            }}
        })
    );
    assert_eq!(apply_patch(form.baseline(), &patch), *form.working_copy());
}

#[test]
fn removing_last_nested_field_prunes_only_its_container() {
    let mut form = FormReducer::new(tree(json!({
        "links": {"c": {"fields": {"a": {"fields": {"b": {}}}}}}
    })));
    form.dispatch(Action::remove_field(path("links[c].fields[a].fields[b]")))
        .unwrap();
    assert_eq!(
        form.working_copy().to_value(),
        json!({"links": {"c": {"fields": {"a": {}}}}})
    );
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        arb_key().prop_map(Action::add_link),
        arb_key().prop_map(Action::remove_link),
        (arb_path(), arb_key()).prop_map(|(parent, name)| Action::add_field(parent, name)),
        arb_path().prop_map(Action::remove_field),
        arb_path().prop_map(|p| Action::set_field(p, Node::empty_map())),
        arb_path().prop_map(|p| Action::set_property(p, "includeAllFields", true)),
        Just(Action::Discard),
    ]
}

proptest! {
    #[test]
    fn prop_reachable_states_round_trip(
        start in arb_tree(),
        actions in prop::collection::vec(arb_action(), 0..12),
    ) {
        let mut form = FormReducer::new(start);
        for action in actions {
            let before = form.state().clone();
            if form.dispatch(action).is_err() {
                prop_assert_eq!(form.state(), &before);
            }
            prop_assert!(form.working_copy().validate().is_ok());
        }
        let patch = form.pending_patch();
        prop_assert_eq!(&apply_patch(form.baseline(), &patch), form.working_copy());
        prop_assert_eq!(patch.is_empty(), !form.is_dirty());
    }

    #[test]
    fn prop_identity_normalizer_round_trips(
        start in arb_tree(),
        actions in prop::collection::vec(arb_action(), 0..12),
    ) {
        let mut form = FormReducer::with_normalizer(start, Identity);
        for action in actions {
            let _ = form.dispatch(action);
        }
        let patch = form.pending_patch();
        prop_assert_eq!(&apply_patch(form.baseline(), &patch), form.working_copy());
    }

    #[test]
    fn prop_route_round_trip(p in arb_path()) {
        let segments = recompose(&p);
        prop_assert_eq!(decompose_route(&segments).unwrap(), p);
    }
}
