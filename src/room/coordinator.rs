//! Collaboration channel coordinator — one task per room subscription.
//!
//! ARCHITECTURE
//! ============
//! The coordinator owns the room's only subscription and is the sole writer
//! of the mirrored collaboration state. It runs a `select!` loop over three
//! sources: local commands from the `RoomHandle`, inbound transport events,
//! and the throttle/focus deadlines. Every mutation is published as a
//! `RoomSnapshot` through a watch channel so rendering code observes without
//! ever touching the maps.
//!
//! LIFECYCLE
//! =========
//! 1. `Disconnected → Subscribing`: subscribe to the room
//! 2. `→ Subscribed`: announce presence, hold the outbound handle
//! 3. Loop: dispatch commands/broadcasts, flush throttles, expire focus
//! 4. `→ Disconnected` (handle dropped, shutdown, or channel closed):
//!    wipe the cursor and selection mirrors, drop the outbound handle
//!
//! DELIVERY POLICIES
//! =================
//! Three distinct policies, named at the send site:
//! - fire-and-forget (cursor/selection ticks): failures logged at debug and
//!   dropped — the next throttled tick resends current state
//! - echo-then-broadcast (highlights): local map mutated first, then sent;
//!   a failed send is logged at warn, the local annotation stands
//! - echo-on-confirm (chat): lives in `room::chat`, not here

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RoomConfig;
use crate::event::{
    CursorPayload, HighlightPayload, HighlightReference, RemoveHighlightPayload, SelectionPayload,
    SelectionRect, WireEvent,
};
use crate::identity::Participant;
use crate::state::cursors::CursorTracker;
use crate::state::references::ReferenceTracker;
use crate::state::selections::{HighlightAdd, SelectionTracker};
use crate::throttle::{Submit, Throttle};
use crate::room::transport::{Outbound, PresenceMeta, Transport, TransportEvent};

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod coordinator_test;

// =============================================================================
// PHASE
// =============================================================================

/// Subscription lifecycle of the room channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPhase {
    #[default]
    Disconnected,
    Subscribing,
    Subscribed,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Read-only view of the room state, published after every mutation.
#[derive(Debug, Clone, Default)]
pub struct RoomSnapshot {
    pub phase: ChannelPhase,
    pub cursors: HashMap<Uuid, CursorPayload>,
    pub selections: HashMap<Uuid, SelectionPayload>,
    pub highlights: HashMap<Uuid, HighlightPayload>,
    pub pending_reference: Option<HighlightReference>,
    pub focused_highlight: Option<Uuid>,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Local input, sent from the UI event loop through the `RoomHandle`.
#[derive(Debug)]
enum Command {
    PointerMoved { x: f64, y: f64 },
    SelectionChanged { rects: Vec<SelectionRect> },
    AddHighlight { rects: Vec<SelectionRect>, text: String, reply: oneshot::Sender<Uuid> },
    RemoveHighlight { id: Uuid },
    ReferenceInChat { rects: Vec<SelectionRect>, text: String },
    ClearPendingReference,
    DismissPendingReference,
    FocusHighlight { id: Uuid },
    Shutdown,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable handle to a running room coordinator. Dropping every handle
/// tears the room down (the unmount path).
#[derive(Clone)]
pub struct RoomHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<RoomSnapshot>,
}

impl RoomHandle {
    pub async fn pointer_moved(&self, x: f64, y: f64) {
        let _ = self.commands.send(Command::PointerMoved { x, y }).await;
    }

    pub async fn selection_changed(&self, rects: Vec<SelectionRect>) {
        let _ = self.commands.send(Command::SelectionChanged { rects }).await;
    }

    /// Create (or reuse) a highlight. `None` if the room is gone.
    pub async fn add_highlight(&self, rects: Vec<SelectionRect>, text: impl Into<String>) -> Option<Uuid> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::AddHighlight { rects, text: text.into(), reply })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub async fn remove_highlight(&self, id: Uuid) {
        let _ = self.commands.send(Command::RemoveHighlight { id }).await;
    }

    /// Stage the selected text as the next chat message's reference.
    pub async fn reference_in_chat(&self, rects: Vec<SelectionRect>, text: impl Into<String>) {
        let _ = self
            .commands
            .send(Command::ReferenceInChat { rects, text: text.into() })
            .await;
    }

    /// The referencing message was sent: release the slot, keep the highlight.
    pub async fn clear_pending_reference(&self) {
        let _ = self.commands.send(Command::ClearPendingReference).await;
    }

    /// The pending chip was dismissed: release the slot AND remove the
    /// never-sent highlight.
    pub async fn dismiss_pending_reference(&self) {
        let _ = self.commands.send(Command::DismissPendingReference).await;
    }

    /// Pulse a highlight after a chat reference was clicked.
    pub async fn focus_highlight(&self, id: Uuid) {
        let _ = self.commands.send(Command::FocusHighlight { id }).await;
    }

    /// Explicit teardown; equivalent to dropping every handle.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    /// Current room state.
    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch stream of room state, one value per mutation.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshot.clone()
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct RoomCoordinator {
    identity: Participant,
    config: RoomConfig,
    phase: ChannelPhase,
    outbound: Option<Arc<dyn Outbound>>,
    cursors: CursorTracker,
    selections: SelectionTracker,
    references: ReferenceTracker,
    cursor_throttle: Throttle<CursorPayload>,
    selection_throttle: Throttle<SelectionPayload>,
    snapshot_tx: watch::Sender<RoomSnapshot>,
}

impl RoomCoordinator {
    /// Spawn the coordinator task for `room` and return its handle.
    #[must_use]
    pub fn spawn(
        room: impl Into<String>,
        identity: Participant,
        transport: Arc<dyn Transport>,
        config: RoomConfig,
    ) -> RoomHandle {
        let (commands, command_rx) = mpsc::channel(config.channel_capacity);
        let (snapshot_tx, snapshot) = watch::channel(RoomSnapshot::default());
        let coordinator = Self::new(identity, config, snapshot_tx);

        tokio::spawn(coordinator.run(room.into(), transport, command_rx));

        RoomHandle { commands, snapshot }
    }

    fn new(identity: Participant, config: RoomConfig, snapshot_tx: watch::Sender<RoomSnapshot>) -> Self {
        Self {
            cursors: CursorTracker::new(identity.clone()),
            selections: SelectionTracker::new(identity.clone()),
            references: ReferenceTracker::new(config.focus_pulse),
            cursor_throttle: Throttle::new(config.throttle),
            selection_throttle: Throttle::new(config.throttle),
            identity,
            config,
            phase: ChannelPhase::Disconnected,
            outbound: None,
            snapshot_tx,
        }
    }

    async fn run(
        mut self,
        room: String,
        transport: Arc<dyn Transport>,
        mut commands: mpsc::Receiver<Command>,
    ) {
        self.phase = ChannelPhase::Subscribing;
        self.publish();

        let subscription = match transport.subscribe(&room, self.config.channel_capacity).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(room, error = %e, "room subscribe failed");
                self.teardown();
                return;
            }
        };
        let mut events = subscription.events;

        let presence = PresenceMeta { id: self.identity.id, name: self.identity.name.clone() };
        if let Err(e) = subscription.outbound.announce(presence).await {
            warn!(room, error = %e, "presence announce failed");
            self.teardown();
            return;
        }

        self.outbound = Some(subscription.outbound);
        self.phase = ChannelPhase::Subscribed;
        info!(room, participant = %self.identity.id, "room subscribed");
        self.publish();

        loop {
            let cursor_due = wake_at(self.cursor_throttle.deadline());
            let selection_due = wake_at(self.selection_throttle.deadline());
            let focus_due = wake_at(self.references.focus_deadline());

            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                event = events.recv() => {
                    match event {
                        Some(TransportEvent::Closed) | None => {
                            warn!(room, "room channel closed");
                            break;
                        }
                        Some(event) => self.handle_transport_event(event).await,
                    }
                }
                () = tokio::time::sleep_until(cursor_due.1), if cursor_due.0 => {
                    if let Some(payload) = self.cursor_throttle.take_due() {
                        self.send_fire_and_forget(WireEvent::CursorMove(payload)).await;
                    }
                }
                () = tokio::time::sleep_until(selection_due.1), if selection_due.0 => {
                    if let Some(payload) = self.selection_throttle.take_due() {
                        self.send_fire_and_forget(WireEvent::Selection(payload)).await;
                    }
                }
                () = tokio::time::sleep_until(focus_due.1), if focus_due.0 => {
                    self.references.expire_focus();
                }
            }

            self.publish();
        }

        self.teardown();
    }

    // -------------------------------------------------------------------------
    // Local commands
    // -------------------------------------------------------------------------

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::PointerMoved { x, y } => {
                let payload = self.cursors.pointer_moved(x, y);
                if let Submit::Fire(payload) = self.cursor_throttle.submit(payload) {
                    self.send_fire_and_forget(WireEvent::CursorMove(payload)).await;
                }
            }
            Command::SelectionChanged { rects } => {
                let payload = self.selections.selection_changed(rects);
                if let Submit::Fire(payload) = self.selection_throttle.submit(payload) {
                    self.send_fire_and_forget(WireEvent::Selection(payload)).await;
                }
            }
            Command::AddHighlight { rects, text, reply } => {
                let id = self.create_highlight(rects, text).await;
                let _ = reply.send(id);
            }
            Command::RemoveHighlight { id } => {
                self.remove_highlight(id).await;
            }
            Command::ReferenceInChat { rects, text } => {
                // Only one pending reference at a time: a highlight that was
                // never attached to a sent message must not linger.
                if let Some(displaced) = self.references.dismiss() {
                    self.remove_highlight(displaced).await;
                }
                let id = self.create_highlight(rects, text.clone()).await;
                let _ = self.references.stage(HighlightReference { id, text });
            }
            Command::ClearPendingReference => {
                self.references.clear_pending();
            }
            Command::DismissPendingReference => {
                if let Some(id) = self.references.dismiss() {
                    self.remove_highlight(id).await;
                }
            }
            Command::FocusHighlight { id } => {
                self.references.focus(id);
            }
            Command::Shutdown => {}
        }
    }

    /// Echo-then-broadcast: the local map is the source of truth, the
    /// broadcast is best-effort.
    async fn create_highlight(&mut self, rects: Vec<SelectionRect>, text: String) -> Uuid {
        match self.selections.add_highlight(rects, text) {
            HighlightAdd::Created(payload) => {
                let id = payload.id;
                self.send_logged(WireEvent::AddHighlight(payload)).await;
                id
            }
            HighlightAdd::Existing(id) => id,
        }
    }

    async fn remove_highlight(&mut self, id: Uuid) {
        self.selections.remove_highlight(id);
        self.send_logged(WireEvent::RemoveHighlight(RemoveHighlightPayload { id })).await;
    }

    // -------------------------------------------------------------------------
    // Transport events
    // -------------------------------------------------------------------------

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        // Broadcasts and presence are only applied on a live subscription;
        // anything after teardown fires into nothing.
        if self.phase != ChannelPhase::Subscribed {
            return;
        }

        match event {
            TransportEvent::Broadcast { body } => match WireEvent::decode(&body) {
                Ok(event) => self.dispatch(event),
                Err(e) => warn!(error = %e, "dropping malformed broadcast"),
            },
            TransportEvent::PeerJoined(meta) => {
                debug!(peer = %meta.id, "peer joined");
                // Join catch-up: replay our last cursor so the newcomer sees
                // it immediately. Live selections and highlights are not
                // replayed — late joiners pick those up from the next change.
                if let Some(payload) = self.cursors.own_payload().cloned() {
                    self.send_fire_and_forget(WireEvent::CursorMove(payload)).await;
                }
            }
            TransportEvent::PeerLeft(peer) => {
                debug!(%peer, "peer left");
                self.cursors.remove_peer(peer);
                self.selections.purge_peer(peer);
            }
            TransportEvent::Closed => {}
        }
    }

    /// Topic dispatch table. Trackers enforce the own-echo rules.
    fn dispatch(&mut self, event: WireEvent) {
        match event {
            WireEvent::CursorMove(payload) => self.cursors.apply_remote(payload),
            WireEvent::Selection(payload) => self.selections.apply_selection(payload),
            WireEvent::AddHighlight(payload) => self.selections.apply_add(payload),
            WireEvent::RemoveHighlight(payload) => self.selections.apply_remove(payload.id),
            WireEvent::ChatMessage(_) => {
                debug!("chat message on the collaboration channel; ignoring");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Sends
    // -------------------------------------------------------------------------

    /// Fire-and-forget: stale state is an acceptable degradation because the
    /// next throttled tick carries current state.
    async fn send_fire_and_forget(&self, event: WireEvent) {
        let Some(outbound) = &self.outbound else { return };
        if let Err(e) = outbound.send(&event).await {
            debug!(topic = event.topic(), error = %e, "dropping ephemeral send");
        }
    }

    /// Echo-then-broadcast tail: local state already changed; a lost
    /// broadcast costs peers the update but never rolls the echo back.
    async fn send_logged(&self, event: WireEvent) {
        let Some(outbound) = &self.outbound else { return };
        if let Err(e) = outbound.send(&event).await {
            warn!(topic = event.topic(), error = %e, "broadcast failed; local state kept");
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    fn teardown(&mut self) {
        self.phase = ChannelPhase::Disconnected;
        self.outbound = None;
        self.cursors.clear();
        self.selections.clear_selections();
        self.cursor_throttle.cancel();
        self.selection_throttle.cancel();
        self.publish();
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.phase,
            cursors: self.cursors.cursors().clone(),
            selections: self.selections.selections().clone(),
            highlights: self.selections.highlights().clone(),
            pending_reference: self.references.pending().cloned(),
            focused_highlight: self.references.focused(),
        }
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send_replace(self.snapshot());
    }
}

/// Convert an optional deadline into a select-armed wake-up. Disabled
/// branches still evaluate their expression, so the fallback instant must be
/// valid even when the guard is false.
fn wake_at(deadline: Option<Instant>) -> (bool, tokio::time::Instant) {
    match deadline {
        Some(due) => (true, tokio::time::Instant::from_std(due)),
        None => (false, tokio::time::Instant::now()),
    }
}
