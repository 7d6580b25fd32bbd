//! Wire events — the closed set of broadcast messages a room can carry.
//!
//! ARCHITECTURE
//! ============
//! Every broadcast in `coread` is a `WireEvent`: a tagged union of topic and
//! payload, serialized as JSON text on the transport. The coordinator decodes
//! at the transport boundary and drops anything malformed, so tracker logic
//! only ever sees well-formed payloads.
//!
//! DESIGN
//! ======
//! - Topics are the serde tag (`event`), payloads the content (`payload`).
//! - Payload shapes are fixed structs, never free-form maps.
//! - Participant identity travels as a `UserRef`; the full `Participant`
//!   (with color) never crosses the wire — color rides in each payload so a
//!   receiver can render without a directory lookup.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

// =============================================================================
// GEOMETRY
// =============================================================================

/// Viewport-pixel position of a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Page-relative pixel bounds of one visual line of a text selection.
/// A multi-line selection decomposes into several rects sharing one payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Minimal participant identity attached to every broadcast payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
}

/// One participant's last known pointer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorPayload {
    pub position: Point,
    pub user: UserRef,
    pub color: String,
    /// Milliseconds since Unix epoch, stamped by the sender.
    pub timestamp: i64,
}

/// One participant's in-progress text selection. Empty `rects` is the clear
/// signal: receivers delete the slot rather than storing an empty record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub rects: Vec<SelectionRect>,
    pub user: UserRef,
    pub color: String,
}

/// A durable annotation over selected text. Unlike a live selection it is
/// keyed by its own id, carries the captured text, and persists until
/// explicitly removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightPayload {
    pub id: Uuid,
    pub text: String,
    pub rects: Vec<SelectionRect>,
    pub user: UserRef,
    pub color: String,
}

/// Removal notice for a highlight. Receivers delete-if-present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveHighlightPayload {
    pub id: Uuid,
}

/// A highlight staged for attachment to an outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightReference {
    pub id: Uuid,
    pub text: String,
}

/// One chat message, optionally referencing a highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    pub id: Uuid,
    pub user: UserRef,
    pub text: String,
    /// Milliseconds since Unix epoch, stamped by the sender.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_ref: Option<HighlightReference>,
}

// =============================================================================
// WIRE EVENT
// =============================================================================

/// The closed tagged union of everything a room broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum WireEvent {
    CursorMove(CursorPayload),
    Selection(SelectionPayload),
    AddHighlight(HighlightPayload),
    RemoveHighlight(RemoveHighlightPayload),
    ChatMessage(ChatMessagePayload),
}

impl WireEvent {
    /// Topic name as it appears on the wire.
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            WireEvent::CursorMove(_) => "cursor-move",
            WireEvent::Selection(_) => "selection",
            WireEvent::AddHighlight(_) => "add-highlight",
            WireEvent::RemoveHighlight(_) => "remove-highlight",
            WireEvent::ChatMessage(_) => "chat-message",
        }
    }

    /// Serialize for the transport.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse an inbound broadcast body. Callers log and drop the frame on
    /// error; malformed peers must never corrupt local state.
    pub fn decode(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

// =============================================================================
// TIME
// =============================================================================

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
