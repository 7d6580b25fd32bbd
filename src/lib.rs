//! Realtime collaboration engine for the shared document reader.
//!
//! Participants reading the same document see each other's pointers, text
//! selections, and highlights live, and can discuss the text in a chat that
//! links messages back to highlighted passages. This crate owns all of that
//! client-side state: the wire protocol, the trackers that mirror room state,
//! and the coordinator tasks that drive the pub/sub channels. The hosted
//! realtime service is reached only through the [`room::transport::Transport`]
//! trait, so everything here runs (and tests) against the in-process
//! [`room::local::LocalHub`] as well.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`event`] | Wire protocol: tagged events and their payloads |
//! | [`identity`] | Participant identity and color assignment |
//! | [`config`] | Tuning knobs with env overrides |
//! | [`throttle`] | Trailing-edge rate limiter for high-frequency input |
//! | [`state`] | Pure trackers: cursors, selections, references, chat log |
//! | [`room`] | Transport seam, coordinators, and the local hub |

pub mod config;
pub mod event;
pub mod identity;
pub mod room;
pub mod state;
pub mod throttle;

pub use config::RoomConfig;
pub use event::{
    ChatMessagePayload, CursorPayload, HighlightPayload, HighlightReference, Point,
    SelectionPayload, SelectionRect, UserRef, WireEvent,
};
pub use identity::Participant;
pub use room::chat::{ChatCoordinator, ChatError, ChatHandle, ChatSnapshot};
pub use room::coordinator::{ChannelPhase, RoomCoordinator, RoomHandle, RoomSnapshot};
pub use room::local::LocalHub;
pub use room::transport::{Transport, TransportError};
