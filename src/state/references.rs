//! Pending-reference and focus-pulse state for chat-linked highlights.
//!
//! DESIGN
//! ======
//! At most one highlight can be staged for the next chat message. Staging a
//! new one while another is outstanding displaces it: the displaced highlight
//! was never attached to a sent message and must not linger, so callers get
//! its id back and are expected to remove it from the highlight map (and
//! broadcast the removal).
//!
//! The focus pulse is a transient visual cue: clicking a reference in an old
//! chat message focuses its highlight for a fixed window, then the signal
//! clears itself. Deadlines are held as instants rather than timers so the
//! owning run loop decides when to wake up, same as the throttle.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::event::HighlightReference;

#[cfg(test)]
#[path = "references_test.rs"]
mod references_test;

struct FocusPulse {
    highlight: Uuid,
    expires: Instant,
}

pub struct ReferenceTracker {
    pulse: Duration,
    pending: Option<HighlightReference>,
    focus: Option<FocusPulse>,
}

impl ReferenceTracker {
    #[must_use]
    pub fn new(pulse: Duration) -> Self {
        Self { pulse, pending: None, focus: None }
    }

    /// Stage a reference for the next outgoing message, returning the id of
    /// the displaced pending highlight (which the caller must remove).
    pub fn stage(&mut self, reference: HighlightReference) -> Option<Uuid> {
        let displaced = self.pending.take().map(|prev| prev.id);
        self.pending = Some(reference);
        displaced
    }

    /// The message carrying the reference was sent: clear the slot only.
    /// The highlight itself stays — it is now part of the conversation.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// The user dismissed the pending chip: clear the slot and return the
    /// highlight id so the caller removes the never-sent highlight.
    pub fn dismiss(&mut self) -> Option<Uuid> {
        self.pending.take().map(|reference| reference.id)
    }

    #[must_use]
    pub fn pending(&self) -> Option<&HighlightReference> {
        self.pending.as_ref()
    }

    /// Start (or restart) the focus pulse for a highlight.
    pub fn focus(&mut self, highlight: Uuid) {
        self.focus_at(highlight, Instant::now());
    }

    fn focus_at(&mut self, highlight: Uuid, now: Instant) {
        self.focus = Some(FocusPulse { highlight, expires: now + self.pulse });
    }

    /// The currently pulsing highlight, if the window is still open.
    #[must_use]
    pub fn focused(&self) -> Option<Uuid> {
        self.focused_at(Instant::now())
    }

    fn focused_at(&self, now: Instant) -> Option<Uuid> {
        let pulse = self.focus.as_ref()?;
        if now < pulse.expires { Some(pulse.highlight) } else { None }
    }

    /// When the active pulse expires, if one is running. The run loop arms a
    /// wake-up for this instant so observers see the signal clear.
    #[must_use]
    pub fn focus_deadline(&self) -> Option<Instant> {
        self.focus.as_ref().map(|pulse| pulse.expires)
    }

    /// Forget an expired pulse so no further wake-ups are armed for it.
    pub fn expire_focus(&mut self) {
        self.expire_focus_at(Instant::now());
    }

    fn expire_focus_at(&mut self, now: Instant) {
        if self.focused_at(now).is_none() {
            self.focus = None;
        }
    }
}
