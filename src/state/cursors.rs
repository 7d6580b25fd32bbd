//! Cursor tracker — local pointer events out, peer cursors in.
//!
//! DESIGN
//! ======
//! One live record per remote participant, overwritten wholesale on every
//! incoming update (last-write-wins, no history). The local participant's
//! cursor is implicit: its id never appears in the mirror map, but the last
//! built payload is buffered so the coordinator can replay it when a new
//! peer joins.

use std::collections::HashMap;

use uuid::Uuid;

use crate::event::{CursorPayload, Point, now_ms};
use crate::identity::Participant;

#[cfg(test)]
#[path = "cursors_test.rs"]
mod cursors_test;

pub struct CursorTracker {
    local: Participant,
    /// Remote mirror: participant id -> last known cursor.
    cursors: HashMap<Uuid, CursorPayload>,
    /// Replay buffer for the join catch-up resend.
    own: Option<CursorPayload>,
}

impl CursorTracker {
    #[must_use]
    pub fn new(local: Participant) -> Self {
        Self { local, cursors: HashMap::new(), own: None }
    }

    /// Build the outgoing payload for a pointer move and arm the replay
    /// buffer with it.
    pub fn pointer_moved(&mut self, x: f64, y: f64) -> CursorPayload {
        let payload = CursorPayload {
            position: Point { x, y },
            user: self.local.user_ref(),
            color: self.local.color.clone(),
            timestamp: now_ms(),
        };
        self.own = Some(payload.clone());
        payload
    }

    /// Upsert a peer's cursor. Own echoes are never applied.
    pub fn apply_remote(&mut self, payload: CursorPayload) {
        if payload.user.id == self.local.id {
            return;
        }
        self.cursors.insert(payload.user.id, payload);
    }

    /// Drop one peer's cursor (presence leave).
    pub fn remove_peer(&mut self, peer: Uuid) {
        self.cursors.remove(&peer);
    }

    /// Wipe the mirror (disconnect or teardown). The replay buffer survives
    /// so a resubscribe can announce the last known position.
    pub fn clear(&mut self) {
        self.cursors.clear();
    }

    #[must_use]
    pub fn cursors(&self) -> &HashMap<Uuid, CursorPayload> {
        &self.cursors
    }

    #[must_use]
    pub fn own_payload(&self) -> Option<&CursorPayload> {
        self.own.as_ref()
    }
}
