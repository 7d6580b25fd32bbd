use super::*;
use crate::event::{ChatMessagePayload, UserRef, now_ms};

fn chat_event(text: &str) -> WireEvent {
    WireEvent::ChatMessage(ChatMessagePayload {
        id: Uuid::new_v4(),
        user: UserRef { id: Uuid::new_v4(), name: "ada".into() },
        text: text.into(),
        timestamp: now_ms(),
        highlight_ref: None,
    })
}

fn presence(name: &str) -> PresenceMeta {
    PresenceMeta { id: Uuid::new_v4(), name: name.into() }
}

// =============================================================================
// Broadcast fan-out
// =============================================================================

#[tokio::test]
async fn broadcast_reaches_peers_but_not_sender() {
    let hub = LocalHub::new();
    let mut a = hub.subscribe("room", 16).await.expect("subscribe a");
    let mut b = hub.subscribe("room", 16).await.expect("subscribe b");

    a.outbound.send(&chat_event("hello")).await.expect("send");

    let event = b.events.recv().await.expect("b receives");
    let TransportEvent::Broadcast { body } = event else {
        panic!("expected broadcast, got {event:?}");
    };
    let decoded = WireEvent::decode(&body).expect("well-formed body");
    assert_eq!(decoded.topic(), "chat-message");

    // Sender must not hear its own broadcast.
    assert!(a.events.try_recv().is_err());
}

#[tokio::test]
async fn rooms_are_isolated() {
    let hub = LocalHub::new();
    let a = hub.subscribe("alpha", 16).await.expect("subscribe a");
    let mut b = hub.subscribe("beta", 16).await.expect("subscribe b");

    a.outbound.send(&chat_event("alpha only")).await.expect("send");
    assert!(b.events.try_recv().is_err());
}

// =============================================================================
// Presence
// =============================================================================

#[tokio::test]
async fn announce_notifies_peers_and_returns_roster() {
    let hub = LocalHub::new();
    let mut a = hub.subscribe("room", 16).await.expect("subscribe a");
    let b = hub.subscribe("room", 16).await.expect("subscribe b");

    let ada = presence("ada");
    let roster = a.outbound.announce(ada.clone()).await.expect("announce a");
    assert!(roster.is_empty(), "nobody announced before ada");

    let grace = presence("grace");
    let roster = b.outbound.announce(grace.clone()).await.expect("announce b");
    assert_eq!(roster, vec![ada]);

    let event = a.events.recv().await.expect("a receives join");
    assert_eq!(event, TransportEvent::PeerJoined(grace));
}

#[tokio::test]
async fn dropping_outbound_emits_leave_to_peers() {
    let hub = LocalHub::new();
    let mut a = hub.subscribe("room", 16).await.expect("subscribe a");
    let b = hub.subscribe("room", 16).await.expect("subscribe b");

    let _ = a.outbound.announce(presence("ada")).await.expect("announce a");
    let grace = presence("grace");
    let _ = b.outbound.announce(grace.clone()).await.expect("announce b");
    let _ = a.events.recv().await.expect("join for grace");

    drop(b);

    let event = a.events.recv().await.expect("a receives leave");
    assert_eq!(event, TransportEvent::PeerLeft(grace.id));
}

#[tokio::test]
async fn unannounced_drop_is_silent() {
    let hub = LocalHub::new();
    let mut a = hub.subscribe("room", 16).await.expect("subscribe a");
    let _ = a.outbound.announce(presence("ada")).await.expect("announce a");

    let b = hub.subscribe("room", 16).await.expect("subscribe b");
    drop(b);

    assert!(a.events.try_recv().is_err());
}

// =============================================================================
// Failure injection
// =============================================================================

#[tokio::test]
async fn injected_failures_reject_sends() {
    let hub = LocalHub::new();
    let mut a = hub.subscribe("room", 16).await.expect("subscribe a");
    let mut b = hub.subscribe("room", 16).await.expect("subscribe b");

    hub.set_fail_sends(true);
    let err = a.outbound.send(&chat_event("dropped")).await;
    assert!(matches!(err, Err(TransportError::Rejected(_))));
    assert!(b.events.try_recv().is_err());

    hub.set_fail_sends(false);
    a.outbound.send(&chat_event("delivered")).await.expect("send works again");
    assert!(b.events.recv().await.is_some());
}
