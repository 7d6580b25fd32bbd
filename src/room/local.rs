//! In-process pub/sub hub implementing `Transport`.
//!
//! DESIGN
//! ======
//! Rooms are maps of connection id -> per-connection sender, mirroring how
//! the hosted service fans a broadcast out to every subscriber except the
//! sender. Fan-out uses `try_send` and drops on a full peer queue: broadcasts
//! are fire-and-forget and a slow local consumer must not stall the room.
//!
//! Used by tests and demos; production wires a real service client behind
//! the same trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::event::WireEvent;
use crate::room::transport::{
    Outbound, PresenceMeta, Subscription, Transport, TransportError, TransportEvent,
};

#[cfg(test)]
#[path = "local_test.rs"]
mod local_test;

// =============================================================================
// HUB
// =============================================================================

#[derive(Default)]
pub struct LocalHub {
    rooms: Mutex<HashMap<String, Arc<RoomShared>>>,
    /// When set, every `send` is rejected. Lets tests exercise the
    /// error-surfacing paths without a real flaky network.
    fail_sends: Arc<AtomicBool>,
}

struct RoomShared {
    conns: Mutex<HashMap<Uuid, Conn>>,
}

struct Conn {
    tx: mpsc::Sender<TransportEvent>,
    presence: Option<PresenceMeta>,
}

impl LocalHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle send failure injection.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl Transport for LocalHub {
    async fn subscribe(&self, room: &str, capacity: usize) -> Result<Subscription, TransportError> {
        let shared = {
            let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                rooms
                    .entry(room.to_owned())
                    .or_insert_with(|| Arc::new(RoomShared { conns: Mutex::new(HashMap::new()) })),
            )
        };

        let (tx, rx) = mpsc::channel(capacity);
        let conn_id = Uuid::new_v4();
        shared
            .conns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(conn_id, Conn { tx, presence: None });

        debug!(room, %conn_id, "local hub: subscribed");

        Ok(Subscription {
            outbound: Arc::new(LocalOutbound {
                shared,
                conn_id,
                fail_sends: Arc::clone(&self.fail_sends),
            }),
            events: rx,
        })
    }
}

// =============================================================================
// OUTBOUND HANDLE
// =============================================================================

struct LocalOutbound {
    shared: Arc<RoomShared>,
    conn_id: Uuid,
    fail_sends: Arc<AtomicBool>,
}

#[async_trait]
impl Outbound for LocalOutbound {
    async fn announce(&self, presence: PresenceMeta) -> Result<Vec<PresenceMeta>, TransportError> {
        let mut conns = self.shared.conns.lock().unwrap_or_else(PoisonError::into_inner);

        let roster: Vec<PresenceMeta> = conns
            .iter()
            .filter(|(id, _)| **id != self.conn_id)
            .filter_map(|(_, conn)| conn.presence.clone())
            .collect();

        for (id, conn) in conns.iter() {
            if *id != self.conn_id {
                let _ = conn.tx.try_send(TransportEvent::PeerJoined(presence.clone()));
            }
        }

        conns
            .get_mut(&self.conn_id)
            .ok_or(TransportError::Closed)?
            .presence = Some(presence);

        Ok(roster)
    }

    async fn send(&self, event: &WireEvent) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(TransportError::Rejected("injected failure".into()));
        }

        let body = event
            .encode()
            .map_err(|e| TransportError::Rejected(e.to_string()))?;

        let conns = self.shared.conns.lock().unwrap_or_else(PoisonError::into_inner);
        for (id, conn) in conns.iter() {
            if *id != self.conn_id {
                let _ = conn.tx.try_send(TransportEvent::Broadcast { body: body.clone() });
            }
        }
        Ok(())
    }
}

impl Drop for LocalOutbound {
    fn drop(&mut self) {
        let mut conns = self.shared.conns.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(conn) = conns.remove(&self.conn_id) else {
            return;
        };
        if let Some(presence) = conn.presence {
            debug!(%presence.id, "local hub: presence left");
            for peer in conns.values() {
                let _ = peer.tx.try_send(TransportEvent::PeerLeft(presence.id));
            }
        }
    }
}
