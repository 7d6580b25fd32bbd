//! End-to-end room synchronization over the in-process hub.
//!
//! Two (or three) coordinators subscribe to the same `LocalHub` room and the
//! tests observe state converging through their watch snapshots. Everything
//! here goes through the public API only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use coread::room::transport::Transport;
use coread::{
    ChannelPhase, ChatCoordinator, ChatError, ChatHandle, LocalHub, Participant, RoomConfig,
    RoomCoordinator, RoomHandle, SelectionRect,
};

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Block until the watched state satisfies `predicate`, or fail the test.
async fn converged<T, F>(rx: &mut watch::Receiver<T>, predicate: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("state did not converge in time")
        .expect("coordinator task ended")
        .clone()
}

async fn join(hub: &Arc<LocalHub>, room: &str, name: &str) -> (Participant, RoomHandle) {
    let identity = Participant::generate(name);
    let handle = RoomCoordinator::spawn(
        room,
        identity.clone(),
        Arc::clone(hub) as Arc<dyn Transport>,
        RoomConfig::default(),
    );
    let mut watch = handle.watch();
    converged(&mut watch, |s| s.phase == ChannelPhase::Subscribed).await;
    (identity, handle)
}

async fn join_chat(hub: &Arc<LocalHub>, room: &str, name: &str) -> (Participant, ChatHandle) {
    let identity = Participant::generate(name);
    let handle = ChatCoordinator::spawn(
        room,
        identity.clone(),
        Arc::clone(hub) as Arc<dyn Transport>,
        RoomConfig::default(),
    );
    let mut watch = handle.watch();
    converged(&mut watch, |s| s.phase == ChannelPhase::Subscribed).await;
    (identity, handle)
}

fn rect() -> SelectionRect {
    SelectionRect { x: 10.0, y: 20.0, width: 120.0, height: 16.0 }
}

#[tokio::test]
async fn cursors_flow_between_participants() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (ada, a) = join(&hub, "doc-1", "ada").await;
    let (_, b) = join(&hub, "doc-1", "grace").await;

    a.pointer_moved(12.0, 34.0).await;

    let mut b_watch = b.watch();
    let seen = converged(&mut b_watch, |s| s.cursors.contains_key(&ada.id)).await;
    let cursor = &seen.cursors[&ada.id];
    assert_eq!((cursor.position.x, cursor.position.y), (12.0, 34.0));
    assert_eq!(cursor.user.name, "ada");
}

#[tokio::test]
async fn late_joiner_sees_replayed_cursors() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (ada, a) = join(&hub, "doc-2", "ada").await;
    a.pointer_moved(1.0, 2.0).await;

    // Joining after the move: ada replays her cursor on the join event.
    let (_, late) = join(&hub, "doc-2", "late").await;
    let mut watch = late.watch();
    converged(&mut watch, |s| s.cursors.contains_key(&ada.id)).await;
}

#[tokio::test]
async fn selections_appear_and_clear() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (ada, a) = join(&hub, "doc-3", "ada").await;
    let (_, b) = join(&hub, "doc-3", "grace").await;
    let mut b_watch = b.watch();

    a.selection_changed(vec![rect()]).await;
    converged(&mut b_watch, |s| s.selections.contains_key(&ada.id)).await;

    // Empty rects travel as a tombstone; the slot disappears on every peer.
    a.selection_changed(vec![]).await;
    converged(&mut b_watch, |s| s.selections.is_empty()).await;
}

#[tokio::test]
async fn highlights_broadcast_and_remove() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (_, a) = join(&hub, "doc-4", "ada").await;
    let (_, b) = join(&hub, "doc-4", "grace").await;
    let mut b_watch = b.watch();

    let id = a
        .add_highlight(vec![rect()], "a striking passage")
        .await
        .expect("room alive");
    converged(&mut b_watch, |s| s.highlights.contains_key(&id)).await;

    a.remove_highlight(id).await;
    converged(&mut b_watch, |s| s.highlights.is_empty()).await;
}

#[tokio::test]
async fn departing_peer_is_purged_everywhere() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (ada, a) = join(&hub, "doc-5", "ada").await;
    let (_, b) = join(&hub, "doc-5", "grace").await;
    let mut b_watch = b.watch();

    a.pointer_moved(3.0, 4.0).await;
    let highlight = a
        .add_highlight(vec![rect()], "gone with the author")
        .await
        .expect("room alive");
    converged(&mut b_watch, |s| {
        s.cursors.contains_key(&ada.id) && s.highlights.contains_key(&highlight)
    })
    .await;

    // Dropping the last handle tears the coordinator down; its outbound
    // handle drops and the hub emits the leave.
    drop(a);

    let seen = converged(&mut b_watch, |s| s.cursors.is_empty()).await;
    assert!(seen.highlights.is_empty(), "departed author's highlights are purged");
}

#[tokio::test]
async fn chat_round_trip_with_roster() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (_, a) = join_chat(&hub, "doc-6:chat", "ada").await;
    let (_, b) = join_chat(&hub, "doc-6:chat", "grace").await;

    let mut a_watch = a.watch();
    converged(&mut a_watch, |s| s.online.len() == 2).await;

    let sent = a.send_message("shall we start?", None).await.expect("send ok");

    let mut b_watch = b.watch();
    let seen = converged(&mut b_watch, |s| !s.messages.is_empty()).await;
    assert_eq!(seen.messages[0].id, sent.id);
    assert_eq!(seen.messages[0].text, "shall we start?");

    // Local echo happened on confirm.
    converged(&mut a_watch, |s| s.messages.len() == 1).await;
}

#[tokio::test]
async fn chat_send_failure_reaches_the_caller() {
    init_tracing();
    let hub = Arc::new(LocalHub::new());
    let (_, a) = join_chat(&hub, "doc-7:chat", "ada").await;

    hub.set_fail_sends(true);
    let result = a.send_message("into the void", None).await;
    assert!(matches!(result, Err(ChatError::Send(_))));
    assert!(a.snapshot().messages.is_empty(), "no echo for a failed send");

    hub.set_fail_sends(false);
    a.send_message("back online", None).await.expect("send recovers");
    let mut a_watch = a.watch();
    let seen = converged(&mut a_watch, |s| s.messages.len() == 1).await;
    assert_eq!(seen.messages[0].text, "back online");
}
