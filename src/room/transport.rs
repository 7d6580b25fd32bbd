//! Transport seam between the coordinators and the pub/sub service.
//!
//! DESIGN
//! ======
//! The remote service owns rooms, presence, and broadcast fan-out; this crate
//! only needs to subscribe to a named room, announce who it is, send wire
//! events, and consume a stream of transport events. Broadcast bodies cross
//! this boundary as JSON text — decoding (and rejecting) them is the
//! coordinator's job, so a misbehaving transport peer cannot corrupt state.
//!
//! Presence is transport-native: the service tracks announced participants
//! per room, emits join/leave keyed by participant id, and reports the
//! current roster when a client announces. Dropping the outbound handle is
//! the leave signal.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::WireEvent;

/// Presence metadata announced to a room and echoed to its peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceMeta {
    pub id: Uuid,
    pub name: String,
}

/// Everything a subscription can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A broadcast from some peer. Body is undecoded JSON text.
    Broadcast { body: String },
    /// A participant announced presence on the room.
    PeerJoined(PresenceMeta),
    /// A participant's presence left the room (including abrupt disconnects).
    PeerLeft(Uuid),
    /// The subscription died and will deliver nothing further.
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("room unavailable: {0}")]
    Unavailable(String),
    #[error("send rejected: {0}")]
    Rejected(String),
    #[error("channel closed")]
    Closed,
}

/// Send-capable handle to one room subscription. Exclusively owned by a
/// coordinator; trackers never see it. Dropping it leaves the room.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Announce local presence, returning the roster of participants already
    /// announced on the room.
    async fn announce(&self, presence: PresenceMeta) -> Result<Vec<PresenceMeta>, TransportError>;

    /// Broadcast one event to every other current subscriber.
    async fn send(&self, event: &WireEvent) -> Result<(), TransportError>;
}

/// A live subscription: the outbound handle plus the inbound event stream.
pub struct Subscription {
    pub outbound: Arc<dyn Outbound>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Factory for room subscriptions — the one thing a hosted service client
/// must implement.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn subscribe(&self, room: &str, capacity: usize) -> Result<Subscription, TransportError>;
}
