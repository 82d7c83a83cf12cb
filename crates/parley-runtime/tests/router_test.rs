use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_core::config::StorageBackend;
use parley_core::errors::{ParleyError, RouterError};
use parley_core::models::DirectMessage;
use parley_core::traits::InboundHandler;
use parley_runtime::IdentityRouter;
use test_fixtures::{account, aid, direct_message, t0, test_config};

#[derive(Default)]
struct RecordingHandler {
    direct: Mutex<Vec<(String, DirectMessage)>>,
    groups: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl InboundHandler for RecordingHandler {
    async fn on_direct_message(&self, identity_id: &str, message: DirectMessage) {
        self.direct.lock().unwrap().push((identity_id.to_string(), message));
    }

    async fn on_group_activity(&self, identity_id: &str, group_id: &str) {
        self.groups
            .lock()
            .unwrap()
            .push((identity_id.to_string(), group_id.to_string()));
    }
}

fn router() -> IdentityRouter {
    IdentityRouter::new(test_config())
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn register_and_lookup_by_id_and_aid() {
    let r = router();
    r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    r.register_identity(&account("side", "bob.example", "Bob")).unwrap();

    assert_eq!(r.identities(), vec!["main", "side"]);
    assert_eq!(r.get_state("main").unwrap().aid(), &aid("alice.example"));
    assert_eq!(r.get_state_by_aid(&aid("bob.example")).unwrap().id(), "side");
    assert!(r.get_state_by_aid(&aid("nobody.example")).is_none());
}

#[test]
fn duplicate_id_is_rejected() {
    let r = router();
    r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    let err = r
        .register_identity(&account("main", "other.example", "Other"))
        .unwrap_err();
    assert!(matches!(err, ParleyError::Router(RouterError::AlreadyRegistered(ref id)) if id == "main"));
    assert_eq!(r.len(), 1);
}

#[test]
fn aid_bound_elsewhere_is_rejected() {
    let r = router();
    r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    let err = r
        .register_identity(&account("second", "alice.example", "Alice"))
        .unwrap_err();
    match err {
        ParleyError::Router(RouterError::AidInUse { aid, owner }) => {
            assert_eq!(aid, "alice.example");
            assert_eq!(owner, "main");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(r.get_state("second").is_none());
}

#[tokio::test]
async fn unreadable_sqlite_database_does_not_block_registration() {
    let dir = tempfile::tempdir().unwrap();
    let identity_dir = dir.path().join("main");
    std::fs::create_dir_all(&identity_dir).unwrap();
    std::fs::write(identity_dir.join("parley.db"), "not a database ".repeat(300)).unwrap();

    let mut config = test_config();
    config.storage.backend = StorageBackend::Sqlite;
    config.storage.data_dir = dir.path().to_path_buf();
    let r = IdentityRouter::new(config);

    let state = r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    let mut contacts = state.contacts.lock().await;
    assert!(contacts.is_empty());
    contacts.record_interaction(&aid("bob.example"), t0());
    assert!(!contacts.is_dirty());
    assert!(identity_dir.join("parley.db.corrupt").exists());
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inbound_reaches_owning_identity() {
    let r = router();
    r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    r.register_identity(&account("side", "carol.example", "Carol")).unwrap();
    let handler = Arc::new(RecordingHandler::default());
    r.set_inbound_handler(handler.clone());

    r.route_inbound(direct_message("carol.example", "bob", Some("s-1"), "hi"))
        .await
        .unwrap();
    r.route_group_activity(&aid("alice.example"), "g-1").await.unwrap();

    let direct = handler.direct.lock().unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].0, "side");
    assert_eq!(direct[0].1.content, "hi");
    assert_eq!(
        *handler.groups.lock().unwrap(),
        vec![("main".to_string(), "g-1".to_string())]
    );
}

#[tokio::test]
async fn unmapped_aid_is_dropped() {
    let r = router();
    let handler = Arc::new(RecordingHandler::default());
    r.set_inbound_handler(handler.clone());

    let err = r
        .route_inbound(direct_message("ghost.example", "bob", None, "hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::UnmappedRoute(ref a) if a == "ghost.example"));
    assert!(handler.direct.lock().unwrap().is_empty());
}

#[tokio::test]
async fn routing_without_handler_fails() {
    let r = router();
    r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    let err = r
        .route_inbound(direct_message("alice.example", "bob", None, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::NoHandler));
}

// ---------------------------------------------------------------------------
// Teardown
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_is_idempotent_and_frees_the_aid() {
    let r = router();
    let state = r.register_identity(&account("main", "alice.example", "Alice")).unwrap();
    state
        .sessions
        .lock()
        .await
        .on_inbound(&aid("bob"), Some("s-1"), "hi", t0())
        .unwrap();

    let stopped = r.stop_identity("main", t0()).await.unwrap();
    assert!(state.is_stopped());
    assert_eq!(stopped.closed.len(), 1);
    assert_eq!(stopped.closed[0].reason, parley_core::CloseReason::Forced);
    assert!(r.get_state("main").is_none());

    assert!(r.stop_identity("main", t0()).await.is_none());

    r.register_identity(&account("again", "alice.example", "Alice")).unwrap();
    assert_eq!(r.get_state_by_aid(&aid("alice.example")).unwrap().id(), "again");
}

#[tokio::test]
async fn stop_all_stops_everyone() {
    let r = router();
    r.register_identity(&account("a", "a.example", "A")).unwrap();
    r.register_identity(&account("b", "b.example", "B")).unwrap();
    assert_eq!(r.stop_all(t0()).await.len(), 2);
    assert!(r.is_empty());
    assert!(r.stop_all(t0()).await.is_empty());
}
