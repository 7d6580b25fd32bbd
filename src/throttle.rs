//! Trailing-edge throttle for fast-firing UI events.
//!
//! DESIGN
//! ======
//! Pointer moves and selection changes arrive far faster than they are worth
//! broadcasting. `Throttle` bounds the publish rate to one value per `delay`
//! while guaranteeing the final value of a burst is never dropped:
//!
//! - If `delay` has elapsed since the last fire, the submitted value fires
//!   immediately (and supersedes any pending value).
//! - Otherwise the value parks in the single pending slot, coalescing with
//!   whatever was parked before, and becomes due at `last_fire + delay`.
//!
//! No leading extra call is ever synthesized and at most one deadline is
//! armed at a time. The throttle itself never sleeps: it reports deadlines
//! and the owning run loop arms timers, so tests drive it with explicit
//! instants the same way `submit_at`/`take_due_at` are driven below.

use std::time::{Duration, Instant};

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

/// What the caller should do with a submitted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submit<T> {
    /// Send `T` now. The throttle recorded the fire.
    Fire(T),
    /// The value parked; arm a timer for the returned deadline.
    Scheduled(Instant),
    /// The value replaced an already-parked one; the armed deadline stands.
    Coalesced,
}

/// Rate limiter with a trailing-edge guarantee. One instance per topic.
#[derive(Debug)]
pub struct Throttle<T> {
    delay: Duration,
    last_fire: Option<Instant>,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Throttle<T> {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay, last_fire: None, pending: None, deadline: None }
    }

    /// Submit a value for publication.
    pub fn submit(&mut self, value: T) -> Submit<T> {
        self.submit_at(value, Instant::now())
    }

    /// Internal: submit with explicit timestamp (for testing).
    fn submit_at(&mut self, value: T, now: Instant) -> Submit<T> {
        let elapsed_enough = self
            .last_fire
            .is_none_or(|last| now.duration_since(last) >= self.delay);

        if elapsed_enough {
            // Anything parked is superseded by the current value.
            self.pending = None;
            self.deadline = None;
            self.last_fire = Some(now);
            return Submit::Fire(value);
        }

        let had_pending = self.pending.is_some();
        self.pending = Some(value);
        if had_pending {
            return Submit::Coalesced;
        }

        // last_fire is Some here, otherwise we fired above.
        let due = self.last_fire.map_or(now, |last| last + self.delay);
        self.deadline = Some(due);
        Submit::Scheduled(due)
    }

    /// The instant at which the parked value becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Pop the parked value if its deadline has passed, recording the fire.
    pub fn take_due(&mut self) -> Option<T> {
        self.take_due_at(Instant::now())
    }

    /// Internal: pop with explicit timestamp (for testing).
    fn take_due_at(&mut self, now: Instant) -> Option<T> {
        let due = self.deadline?;
        if now < due {
            return None;
        }
        self.deadline = None;
        self.last_fire = Some(now);
        self.pending.take()
    }

    /// Drop any parked value and deadline. Used at teardown so a late timer
    /// fires into nothing.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }
}
