//! Room plumbing: transport abstraction and per-room coordinators.
//!
//! ARCHITECTURE
//! ============
//! The hosted pub/sub service is reached only through the `Transport` trait.
//! One coordinator task owns each subscription: `coordinator` for the
//! collaboration channel (cursors, selections, highlights, references) and
//! `chat` for the chat channel. Coordinators are the sole writers of the
//! mirrored state; everything else observes through watch snapshots.

pub mod chat;
pub mod coordinator;
pub mod local;
pub mod transport;
