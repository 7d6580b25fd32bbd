//! Selection/highlight tracker — live selections and durable annotations.
//!
//! DESIGN
//! ======
//! Two maps with different keys and lifetimes:
//!
//! - Live selections: at most one per remote participant, keyed by
//!   participant id. An update with zero rects deletes the slot; an empty
//!   record is never stored.
//! - Highlights: unbounded, keyed by highlight id, surviving until an
//!   explicit remove. The local user's own highlights live here too
//!   (optimistic echo at creation time), which is why incoming
//!   `add-highlight` broadcasts that echo the local id are skipped.
//!
//! Adding a highlight whose text already exists locally returns the existing
//! id instead of minting a duplicate, so a repeated "Reference in Chat" on
//! the same passage is idempotent.

use std::collections::HashMap;

use uuid::Uuid;

use crate::event::{HighlightPayload, SelectionPayload, SelectionRect};
use crate::identity::Participant;

#[cfg(test)]
#[path = "selections_test.rs"]
mod selections_test;

/// Result of a local highlight creation.
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightAdd {
    /// Fresh highlight, already applied locally; broadcast the payload.
    Created(HighlightPayload),
    /// A highlight with identical text already existed; nothing to send.
    Existing(Uuid),
}

impl HighlightAdd {
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            HighlightAdd::Created(payload) => payload.id,
            HighlightAdd::Existing(id) => *id,
        }
    }
}

pub struct SelectionTracker {
    local: Participant,
    /// Remote mirror: participant id -> current live selection.
    selections: HashMap<Uuid, SelectionPayload>,
    /// Durable annotations: highlight id -> record. Local and remote alike.
    highlights: HashMap<Uuid, HighlightPayload>,
}

impl SelectionTracker {
    #[must_use]
    pub fn new(local: Participant) -> Self {
        Self { local, selections: HashMap::new(), highlights: HashMap::new() }
    }

    /// Build the outgoing payload for a selection change. Empty `rects` is
    /// the clear signal and is broadcast as-is.
    #[must_use]
    pub fn selection_changed(&self, rects: Vec<SelectionRect>) -> SelectionPayload {
        SelectionPayload { rects, user: self.local.user_ref(), color: self.local.color.clone() }
    }

    /// Reconcile a peer's live selection. Own echoes are never applied;
    /// empty rects delete the slot (idempotent).
    pub fn apply_selection(&mut self, payload: SelectionPayload) {
        if payload.user.id == self.local.id {
            return;
        }
        if payload.rects.is_empty() {
            self.selections.remove(&payload.user.id);
        } else {
            self.selections.insert(payload.user.id, payload);
        }
    }

    /// Create a highlight locally (optimistic echo). Returns the payload to
    /// broadcast for a fresh highlight, or just the id when identical text
    /// already exists.
    pub fn add_highlight(&mut self, rects: Vec<SelectionRect>, text: impl Into<String>) -> HighlightAdd {
        let text = text.into();
        if let Some(existing) = self.highlights.values().find(|h| h.text == text) {
            return HighlightAdd::Existing(existing.id);
        }

        let payload = HighlightPayload {
            id: Uuid::new_v4(),
            text,
            rects,
            user: self.local.user_ref(),
            color: self.local.color.clone(),
        };
        self.highlights.insert(payload.id, payload.clone());
        HighlightAdd::Created(payload)
    }

    /// Delete a highlight locally. Returns whether it was present; callers
    /// broadcast the removal either way.
    pub fn remove_highlight(&mut self, id: Uuid) -> bool {
        self.highlights.remove(&id).is_some()
    }

    /// Reconcile a peer's highlight creation. Skipped when it echoes the
    /// local id — the optimistic echo already applied it.
    pub fn apply_add(&mut self, payload: HighlightPayload) {
        if payload.user.id == self.local.id {
            return;
        }
        self.highlights.insert(payload.id, payload);
    }

    /// Reconcile a highlight removal. Delete-if-present, no error if absent.
    pub fn apply_remove(&mut self, id: Uuid) {
        self.highlights.remove(&id);
    }

    /// Presence-leave garbage collection: the peer's live selection and every
    /// highlight they authored.
    pub fn purge_peer(&mut self, peer: Uuid) {
        self.selections.remove(&peer);
        self.highlights.retain(|_, h| h.user.id != peer);
    }

    /// Wipe the transient mirror on disconnect. Highlights are durable and
    /// survive; ghost selections must not.
    pub fn clear_selections(&mut self) {
        self.selections.clear();
    }

    #[must_use]
    pub fn selections(&self) -> &HashMap<Uuid, SelectionPayload> {
        &self.selections
    }

    #[must_use]
    pub fn highlights(&self) -> &HashMap<Uuid, HighlightPayload> {
        &self.highlights
    }
}
