use pretty_assertions::assert_eq;
use serde_json::json;
use viewlinks_form::{Action, EditorConfig, PanelEvent, PanelState, SaveMode};
use viewlinks_session::{
    revision_of, FileStore, MemoryStore, SaveOutcome, SessionError, Validator, ViewSession,
    ViewStore, WriteMode,
};
use viewlinks_test_utils::{path, sample_view, tree};
use viewlinks_tree::{ConfigTree, Node};

async fn open(store: &MemoryStore) -> ViewSession<MemoryStore> {
    ViewSession::open(store.clone(), "products", EditorConfig::default())
        .await
        .unwrap()
}

#[tokio::test]
async fn save_promotes_working_copy() {
    let store = MemoryStore::new().with_view("products", tree(json!({"links": {}})));
    let mut session = open(&store).await;

    session.dispatch(Action::add_link("coll1")).unwrap();
    session
        .dispatch(Action::set_field(path("links[coll1].fields[name]"), Node::empty_map()))
        .unwrap();
    assert!(session.is_dirty());

    let outcome = session.save().await.unwrap();
    let SaveOutcome::Saved { revision, summary, mode } = outcome else {
        panic!("expected a write");
    };
    assert_eq!(mode, WriteMode::Patch);
    assert_eq!(summary.assignments, 1);
    assert_eq!(&revision, session.revision());

    assert!(!session.is_dirty());
    assert_eq!(session.baseline(), session.working_copy());
    assert_eq!(store.get("products").as_ref(), Some(session.working_copy()));
    assert_eq!(revision, revision_of(session.working_copy()).unwrap());
}

#[tokio::test]
async fn empty_patch_skips_write() {
    let store = MemoryStore::new().with_view("products", sample_view());
    let mut session = open(&store).await;

    session.dispatch(Action::add_link("tmp")).unwrap();
    session.dispatch(Action::remove_link("tmp")).unwrap();

    assert_eq!(session.save().await.unwrap(), SaveOutcome::Unchanged);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn validation_failure_keeps_working_copy() {
    let store = MemoryStore::new()
        .with_view("products", sample_view())
        .with_validator(Validator::known_analyzers(["identity", "text_en", "text_de"]));
    let mut session = open(&store).await;

    session
        .dispatch(Action::set_property(
            path("links[reviews]"),
            "analyzers",
            Node::try_from(json!(["text_xx"])).unwrap(),
        ))
        .unwrap();
    let edited = session.working_copy().clone();

    let err = session.save().await.unwrap_err();
    match &err {
        SessionError::Validation { message } => {
            assert_eq!(message, "unknown analyzer 'text_xx' at links[reviews]");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(err.is_user_recoverable());
    assert_eq!(session.working_copy(), &edited);
    assert!(session.is_dirty());
    assert_eq!(store.get("products"), Some(sample_view()));
}

#[tokio::test]
async fn network_failure_is_not_retried() {
    let store = MemoryStore::new().with_view("products", sample_view());
    let mut session = open(&store).await;
    session.dispatch(Action::add_link("coll1")).unwrap();

    store.fail_next("connection reset");
    let err = session.save().await.unwrap_err();
    assert!(matches!(err, SessionError::Network { .. }));
    assert_eq!(store.writes(), 0);
    assert!(session.is_dirty());

    let outcome = session.save().await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    assert_eq!(store.writes(), 1);
}

#[tokio::test]
async fn concurrent_edit_is_detected() {
    let store = MemoryStore::new().with_view("products", sample_view());
    let mut session = open(&store).await;
    session.dispatch(Action::add_link("mine")).unwrap();

    let theirs = sample_view()
        .set(&path("links[theirs]"), Node::empty_map())
        .unwrap();
    store.insert("products", theirs.clone());

    let err = session.save().await.unwrap_err();
    assert!(matches!(err, SessionError::ConcurrentEdit { .. }));
    assert_eq!(store.get("products"), Some(theirs.clone()));

    assert!(matches!(
        session.reload(false).await,
        Err(SessionError::UnsavedChanges)
    ));
    assert!(session.working_copy().contains_link("mine"));

    session.reload(true).await.unwrap();
    assert_eq!(session.working_copy(), &theirs);
    assert!(!session.is_dirty());
    assert_eq!(session.revision(), &revision_of(&theirs).unwrap());
}

#[tokio::test]
async fn full_mode_replaces_links() {
    let store = MemoryStore::new().with_view("products", sample_view());
    let config = EditorConfig::default().with_save_mode(SaveMode::Full);
    let mut session = ViewSession::open(store.clone(), "products", config).await.unwrap();

    session
        .dispatch(Action::remove_field(path("links[products].fields[price]")))
        .unwrap();
    let outcome = session.save().await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { mode: WriteMode::Full, .. }));
    assert_eq!(store.get("products").as_ref(), Some(session.working_copy()));
}

#[tokio::test]
async fn patch_mode_falls_back_without_partial_updates() {
    let store = MemoryStore::new()
        .with_view("products", sample_view())
        .without_partial_updates();
    let config = EditorConfig::default().with_save_mode(SaveMode::Patch);
    let mut session = ViewSession::open(store.clone(), "products", config).await.unwrap();

    session.dispatch(Action::add_link("coll1")).unwrap();
    let outcome = session.save().await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { mode: WriteMode::Full, .. }));
}

#[tokio::test]
async fn open_missing_view() {
    let store = MemoryStore::new();
    let err = ViewSession::open(store, "nope", EditorConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotFound { view } if view == "nope"));
}

#[tokio::test]
async fn discard_and_reload_when_clean() {
    let store = MemoryStore::new().with_view("products", sample_view());
    let mut session = open(&store).await;

    session.dispatch(Action::remove_link("reviews")).unwrap();
    assert!(session.discard().unwrap());
    assert_eq!(session.working_copy(), &sample_view());

    session.reload(false).await.unwrap();
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn reload_resets_navigation_to_vanished_path() {
    let store = MemoryStore::new().with_view("products", sample_view());
    let mut session = open(&store).await;
    session
        .navigator_mut()
        .handle(PanelEvent::ViewLink(path("links[reviews]")));

    store.insert("products", ConfigTree::new());
    session.reload(false).await.unwrap();
    assert_eq!(session.navigator().panel(), PanelState::LinkList);
    assert_eq!(session.navigator().current(), None);
}

#[tokio::test]
async fn file_store_session_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("views")).await.unwrap();
    store.create_view("products", &sample_view()).await.unwrap();

    let mut session = ViewSession::open(store.clone(), "products", EditorConfig::default())
        .await
        .unwrap();
    session
        .dispatch(Action::add_field(path("links[reviews]"), "body"))
        .unwrap();
    session.save().await.unwrap();

    let reloaded = store.load("products").await.unwrap();
    assert_eq!(&reloaded.tree, session.working_copy());
    assert_eq!(&reloaded.revision, session.revision());
    assert!(reloaded.tree.get(&path("links[reviews].fields[body]")).unwrap().is_some());

    let stale = store
        .replace_links("products", &sample_view(), &revision_of(&sample_view()).unwrap())
        .await;
    assert!(stale.is_err());
}
