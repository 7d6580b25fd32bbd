//! Session identity — who the local client is for the lifetime of a room.
//!
//! DESIGN
//! ======
//! A `Participant` is minted once at room-join and held until room-leave; it
//! is ephemeral (a fresh id and color per session, not stable across reloads)
//! and is not an authenticated identity. An optional login only contributes
//! the display name.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::UserRef;

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

/// The local client's identity within one room session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    /// CSS color used for this participant's cursor, selections, and
    /// highlights on every peer's screen.
    pub color: String,
}

impl Participant {
    /// Mint a fresh session identity with a random id and presence color.
    #[must_use]
    pub fn generate(name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), name: name.into(), color: random_color() }
    }

    /// The wire-format identity attached to outgoing payloads.
    #[must_use]
    pub fn user_ref(&self) -> UserRef {
        UserRef { id: self.id, name: self.name.clone() }
    }
}

/// Random fully-saturated presence color. Hue is the only free axis so every
/// participant lands on the same lightness band.
fn random_color() -> String {
    let hue: u16 = rand::rng().random_range(0..360);
    format!("hsl({hue}, 100%, 70%)")
}
