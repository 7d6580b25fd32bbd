//! Per-feature collaboration state, mirrored from room broadcasts.
//!
//! ARCHITECTURE
//! ============
//! Tracker modules own pure state transitions: building outgoing payloads
//! from local input and reconciling incoming broadcasts into the remote
//! mirror maps. They never talk to the transport — the room coordinator
//! drives them and owns every send, so rendering code only ever observes.

pub mod chat;
pub mod cursors;
pub mod references;
pub mod selections;
