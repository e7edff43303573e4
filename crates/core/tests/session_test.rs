//! Session lifecycle tests: selection, switching, lock/unlock, removal.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use lnb::testing::{MockConnector, session_with_connectors, test_account};
use lnb::{Error, Session};
use parking_lot::Mutex;

fn two_account_session() -> (Arc<Session>, Arc<MockConnector>, Arc<MockConnector>) {
    let alice = MockConnector::new("alice");
    let bob = MockConnector::new("bob");
    let session = session_with_connectors(vec![alice.clone(), bob.clone()]);
    session.add_account(test_account("acc1", "Alice"));
    session.add_account(test_account("acc2", "Bob"));
    (session, alice, bob)
}

#[tokio::test]
async fn switch_unloads_old_before_initializing_new() {
    let (session, alice, bob) = two_account_session();
    let log = Arc::new(Mutex::new(Vec::new()));
    alice.log_events_to(Arc::clone(&log));
    bob.log_events_to(Arc::clone(&log));

    session.select_account("acc1").await.unwrap();
    session.select_account("acc2").await.unwrap();

    assert_eq!(
        log.lock().clone(),
        vec!["init:alice", "unload:alice", "init:bob"]
    );
    assert_eq!(alice.counts.init.load(Ordering::SeqCst), 1);
    assert_eq!(alice.counts.unload.load(Ordering::SeqCst), 1);
    assert_eq!(bob.counts.init.load(Ordering::SeqCst), 1);
    assert_eq!(session.current_account_id().await.as_deref(), Some("acc2"));
}

#[tokio::test]
async fn select_unknown_account_fails() {
    let (session, _alice, _bob) = two_account_session();
    let err = session.select_account("nope").await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(session.current_account_id().await, None);
}

#[tokio::test]
async fn failed_init_leaves_selection_without_connector() {
    let alice = MockConnector::new("alice");
    alice.fail_init(true);
    let session = session_with_connectors(vec![alice]);
    session.add_account(test_account("acc1", "Alice"));

    let err = session.select_account("acc1").await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));

    let status = session.status().await;
    assert_eq!(status.current_account_id.as_deref(), Some("acc1"));
    assert!(!status.unlocked);
    assert!(session.current().await.is_none());
}

#[tokio::test]
async fn lock_keeps_selection_and_unlock_rebinds() {
    let (session, alice, _bob) = two_account_session();
    session.select_account("acc1").await.unwrap();

    session.lock().await;
    assert_eq!(alice.counts.unload.load(Ordering::SeqCst), 1);
    let status = session.status().await;
    assert!(!status.unlocked);
    assert_eq!(status.current_account_id.as_deref(), Some("acc1"));

    let id = session.unlock().await.unwrap();
    assert_eq!(id, "acc1");
    assert!(session.status().await.unlocked);
}

#[tokio::test]
async fn unlock_without_selection_fails() {
    let (session, _alice, _bob) = two_account_session();
    let err = session.unlock().await.unwrap_err();
    assert!(matches!(err, Error::NoCurrentAccount));
}

#[tokio::test]
async fn removing_current_account_clears_selection() {
    let (session, alice, _bob) = two_account_session();
    session.select_account("acc1").await.unwrap();

    let was_current = session.remove_account("acc1").await.unwrap();
    assert!(was_current);
    assert_eq!(alice.counts.unload.load(Ordering::SeqCst), 1);

    let status = session.status().await;
    assert!(status.configured);
    assert!(!status.unlocked);
    assert_eq!(status.current_account_id, None);
}

#[tokio::test]
async fn removing_other_account_keeps_selection() {
    let (session, _alice, _bob) = two_account_session();
    session.select_account("acc1").await.unwrap();

    let was_current = session.remove_account("acc2").await.unwrap();
    assert!(!was_current);
    assert_eq!(session.current_account_id().await.as_deref(), Some("acc1"));
    assert!(session.status().await.unlocked);
}

#[tokio::test]
async fn edits_apply_to_the_stored_account() {
    let (session, _alice, _bob) = two_account_session();
    let edited = session
        .edit_account(
            "acc1",
            lnb::AccountEdit {
                name: Some("Alicia".to_string()),
                avatar_url: Some("https://example.com/a.png".to_string()),
            },
        )
        .unwrap();
    assert_eq!(edited.name, "Alicia");
    assert_eq!(
        session.account("acc1").unwrap().avatar_url.as_deref(),
        Some("https://example.com/a.png")
    );
}

#[tokio::test]
async fn shutdown_unloads_and_clears() {
    let (session, alice, _bob) = two_account_session();
    session.select_account("acc1").await.unwrap();

    session.shutdown().await;
    assert_eq!(alice.counts.unload.load(Ordering::SeqCst), 1);
    assert_eq!(session.current_account_id().await, None);
}
