use parley_core::models::CloseReason;
use parley_core::traits::{AgentDispatcher, DispatchKind, DispatchRequest, SnapshotStore, Transport};
use std::time::Duration;
use test_fixtures::*;

#[test]
fn golden_directories_are_populated() {
    assert!(!list_fixtures("credit").is_empty());
    assert!(!list_fixtures("vitality").is_empty());
    assert!(fixture_path("replies/post_process.json").exists());
    let cases: serde_json::Value = load_fixture("credit/credit_scores.json");
    assert!(cases.as_array().is_some_and(|a| !a.is_empty()));
}

#[test]
fn closed_session_builder_is_consistent() {
    let closed = closed_session("peer.example", CloseReason::EndMarker, 6, 120);
    assert_eq!(closed.duration_ms(), 120_000);
    assert_eq!(closed.session.close_reason, Some(CloseReason::EndMarker));
    assert_eq!(closed.transcript.len(), 4);
}

#[tokio::test]
async fn mock_transport_filters_pulls_by_watermark() {
    let transport = MockTransport::new();
    for id in 1..=5 {
        transport.push_group_message(group_message("g1", id, "peer.example", "hi"));
    }
    let pulled = transport.pull_group_messages("g1", 3).await.unwrap();
    assert_eq!(pulled.iter().map(|m| m.msg_id).collect::<Vec<_>>(), vec![4, 5]);
    assert!(transport.pull_group_messages("g2", 0).await.unwrap().is_empty());
    assert_eq!(transport.pull_count(), 2);
}

#[tokio::test]
async fn mock_transport_scripted_connect_failures() {
    let transport = MockTransport::new();
    transport.fail_next_connects(2);
    assert!(transport.connect().await.is_err());
    assert!(transport.connect().await.is_err());
    assert!(transport.connect().await.is_ok());
    assert_eq!(transport.connect_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn scripted_dispatcher_serves_queue_then_fallback() {
    let dispatcher = ScriptedDispatcher::new();
    dispatcher.push_reply("one");
    dispatcher.set_fallback("again");
    dispatcher.set_delay(Duration::from_secs(5));

    let request = DispatchRequest {
        identity_id: "main".into(),
        kind: DispatchKind::Group {
            group_id: "g1".into(),
        },
        prompt: "p".into(),
        deadline: Duration::from_secs(30),
    };
    assert_eq!(dispatcher.dispatch(request.clone()).await.unwrap(), "one");
    assert_eq!(dispatcher.dispatch(request).await.unwrap(), "again");
    assert_eq!(dispatcher.requests().len(), 2);
    assert_eq!(dispatcher.max_in_flight(), 1);
}

#[test]
fn flaky_store_fails_on_demand() {
    let store: FlakyStore<u32> = FlakyStore::new();
    store.save_all(&[1, 2]).unwrap();
    store.set_fail_saves(true);
    assert!(store.save_all(&[3]).is_err());
    assert_eq!(store.items(), vec![1, 2]);
    assert_eq!(store.save_count(), 1);
    assert!(FlakyStore::<u32>::corrupt().load_all().is_err());
}
