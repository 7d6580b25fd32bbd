//! Chat channel coordinator.
//!
//! ARCHITECTURE
//! ============
//! Chat runs on its own channel with its own coordinator task, separate from
//! the collaboration channel: a slow chat history must never delay a cursor
//! tick, and presence on the two channels is tracked independently. The loop
//! shape matches `room::coordinator`, minus the throttles.
//!
//! DELIVERY
//! ========
//! Chat is echo-on-confirm. A local send goes to the transport first and is
//! appended to the log only after the transport accepts it; a rejected send
//! surfaces the error to the caller and the log stays untouched. Peer
//! messages append on arrival.

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use std::sync::Arc;

use uuid::Uuid;

use crate::config::RoomConfig;
use crate::event::{ChatMessagePayload, HighlightReference, WireEvent, now_ms};
use crate::identity::Participant;
use crate::room::transport::{
    Outbound, PresenceMeta, Transport, TransportError, TransportEvent,
};
use crate::state::chat::{ChatLog, OnlineUser};

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat channel is not connected")]
    NotConnected,
    #[error("chat send failed: {0}")]
    Send(#[from] TransportError),
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Subscription lifecycle of the chat channel. Mirrors the collaboration
/// channel's phases.
pub use super::coordinator::ChannelPhase;

/// Read-only view of the chat state, published after every mutation.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub phase: ChannelPhase,
    pub messages: Vec<ChatMessagePayload>,
    pub online: Vec<OnlineUser>,
}

// =============================================================================
// COMMANDS
// =============================================================================

enum ChatCommand {
    Send {
        text: String,
        highlight_ref: Option<HighlightReference>,
        reply: oneshot::Sender<Result<ChatMessagePayload, ChatError>>,
    },
    Shutdown,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable handle to a running chat coordinator.
#[derive(Clone)]
pub struct ChatHandle {
    commands: mpsc::Sender<ChatCommand>,
    snapshot: watch::Receiver<ChatSnapshot>,
}

impl ChatHandle {
    /// Send a message, optionally carrying a highlight reference. Returns the
    /// confirmed payload, or the transport error when the send was rejected.
    pub async fn send_message(
        &self,
        text: impl Into<String>,
        highlight_ref: Option<HighlightReference>,
    ) -> Result<ChatMessagePayload, ChatError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(ChatCommand::Send { text: text.into(), highlight_ref, reply })
            .await
            .map_err(|_| ChatError::NotConnected)?;
        rx.await.map_err(|_| ChatError::NotConnected)?
    }

    /// Explicit teardown; equivalent to dropping every handle.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(ChatCommand::Shutdown).await;
    }

    /// Current chat state.
    #[must_use]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch stream of chat state, one value per mutation.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot.clone()
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct ChatCoordinator {
    identity: Participant,
    config: RoomConfig,
    phase: ChannelPhase,
    outbound: Option<Arc<dyn Outbound>>,
    log: ChatLog,
    snapshot_tx: watch::Sender<ChatSnapshot>,
}

impl ChatCoordinator {
    /// Spawn the chat coordinator task for `room` and return its handle.
    #[must_use]
    pub fn spawn(
        room: impl Into<String>,
        identity: Participant,
        transport: Arc<dyn Transport>,
        config: RoomConfig,
    ) -> ChatHandle {
        let (commands, command_rx) = mpsc::channel(config.channel_capacity);
        let (snapshot_tx, snapshot) = watch::channel(ChatSnapshot::default());
        let coordinator = Self::new(identity, config, snapshot_tx);

        tokio::spawn(coordinator.run(room.into(), transport, command_rx));

        ChatHandle { commands, snapshot }
    }

    fn new(identity: Participant, config: RoomConfig, snapshot_tx: watch::Sender<ChatSnapshot>) -> Self {
        Self {
            identity,
            config,
            phase: ChannelPhase::Disconnected,
            outbound: None,
            log: ChatLog::new(),
            snapshot_tx,
        }
    }

    async fn run(
        mut self,
        room: String,
        transport: Arc<dyn Transport>,
        mut commands: mpsc::Receiver<ChatCommand>,
    ) {
        self.phase = ChannelPhase::Subscribing;
        self.publish();

        let subscription = match transport.subscribe(&room, self.config.channel_capacity).await {
            Ok(subscription) => subscription,
            Err(e) => {
                warn!(room, error = %e, "chat subscribe failed");
                self.teardown();
                return;
            }
        };
        let mut events = subscription.events;

        let presence = PresenceMeta { id: self.identity.id, name: self.identity.name.clone() };
        let roster = match subscription.outbound.announce(presence).await {
            Ok(roster) => roster,
            Err(e) => {
                warn!(room, error = %e, "chat presence announce failed");
                self.teardown();
                return;
            }
        };

        // Seed the roster from presence already on the channel, plus us.
        let mut online: Vec<OnlineUser> = roster
            .into_iter()
            .map(|meta| OnlineUser { id: meta.id, name: meta.name })
            .collect();
        online.push(OnlineUser { id: self.identity.id, name: self.identity.name.clone() });
        self.log.set_roster(online);

        self.outbound = Some(subscription.outbound);
        self.phase = ChannelPhase::Subscribed;
        info!(room, participant = %self.identity.id, "chat subscribed");
        self.publish();

        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(ChatCommand::Shutdown) | None => break,
                        Some(command) => self.handle_command(command).await,
                    }
                }
                event = events.recv() => {
                    match event {
                        Some(TransportEvent::Closed) | None => {
                            warn!(room, "chat channel closed");
                            break;
                        }
                        Some(event) => self.handle_transport_event(event),
                    }
                }
            }

            self.publish();
        }

        self.teardown();
    }

    async fn handle_command(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::Send { text, highlight_ref, reply } => {
                let _ = reply.send(self.send_message(text, highlight_ref).await);
            }
            ChatCommand::Shutdown => {}
        }
    }

    /// Echo-on-confirm: append to the log only after the transport accepted
    /// the send, so a failed message never shows up as delivered.
    async fn send_message(
        &mut self,
        text: String,
        highlight_ref: Option<HighlightReference>,
    ) -> Result<ChatMessagePayload, ChatError> {
        let outbound = self.outbound.as_ref().ok_or(ChatError::NotConnected)?;

        let message = ChatMessagePayload {
            id: Uuid::new_v4(),
            user: self.identity.user_ref(),
            text,
            timestamp: now_ms(),
            highlight_ref,
        };

        outbound.send(&WireEvent::ChatMessage(message.clone())).await?;
        self.log.push(message.clone());
        Ok(message)
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.phase != ChannelPhase::Subscribed {
            return;
        }

        match event {
            TransportEvent::Broadcast { body } => match WireEvent::decode(&body) {
                Ok(WireEvent::ChatMessage(message)) => self.log.push(message),
                Ok(event) => {
                    debug!(topic = event.topic(), "non-chat event on the chat channel; ignoring");
                }
                Err(e) => warn!(error = %e, "dropping malformed chat broadcast"),
            },
            TransportEvent::PeerJoined(meta) => {
                debug!(peer = %meta.id, "chat peer joined");
                self.log.apply_join(OnlineUser { id: meta.id, name: meta.name });
            }
            TransportEvent::PeerLeft(peer) => {
                debug!(%peer, "chat peer left");
                self.log.apply_leave(peer);
            }
            TransportEvent::Closed => {}
        }
    }

    fn teardown(&mut self) {
        self.phase = ChannelPhase::Disconnected;
        self.outbound = None;
        self.log.set_roster(vec![]);
        self.publish();
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            phase: self.phase,
            messages: self.log.messages().to_vec(),
            online: self.log.online().to_vec(),
        }
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send_replace(self.snapshot());
    }
}
