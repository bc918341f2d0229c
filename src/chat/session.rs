//! Live chat session for one study group.
//!
//! A [`ChatSession`] owns everything for one mounted chat: the rendered
//! message list seeded from a REST backlog, the optimistic-send bookkeeping,
//! and one transport connection. Remounting (a new group, a fresh backlog)
//! means dropping the session and spawning a new one; no state carries over.

use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::frame::{self, OutboundFrame};
use super::state::{InboundOutcome, SessionState};
use super::transport::{Connector, TransportEvent, WsConnector};
use super::types::{ChatMessage, ConnectionStatus, SessionUpdate};
use crate::error::{ChatError, Result};
use crate::ChatConfig;

/// Display name used for an optimistic send when the local user has neither a
/// profile name nor an id to show.
const LOCAL_FALLBACK_NAME: &str = "Vos";

const UPDATE_BUFFER_SIZE: usize = 100;

/// Construction parameters for one live session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub group_id: String,

    /// Backlog snapshot from the REST backend; copied on construction.
    pub initial_messages: Vec<ChatMessage>,

    /// Local user id. `None` opens the session read-only: the backlog is
    /// rendered but no connection is made and sends are rejected.
    pub current_user_id: Option<String>,

    /// Local user display name for optimistic entries.
    pub current_user_name: Option<String>,
}

struct SessionShared {
    state: Mutex<SessionState>,
    status: Mutex<ConnectionStatus>,
    updates: broadcast::Sender<SessionUpdate>,
}

impl SessionShared {
    fn set_status(&self, next: ConnectionStatus) {
        let mut status = self.status.lock().unwrap();
        if *status != next {
            *status = next;
            let _ = self.updates.send(SessionUpdate::StatusChanged(next));
        }
    }
}

pub struct ChatSession {
    group_id: String,
    user_id: Option<String>,
    user_name: Option<String>,
    shared: Arc<SessionShared>,
    outbound: Option<mpsc::Sender<String>>,
    driver: Option<JoinHandle<()>>,
}

impl ChatSession {
    /// Open a live session over the default WebSocket connector.
    pub fn spawn(config: &ChatConfig, session: SessionConfig) -> Self {
        Self::spawn_with_connector(config, session, &WsConnector)
    }

    /// Open a live session over a caller-provided connector.
    ///
    /// Seeds the rendered list from `session.initial_messages`, then, if a
    /// local user id is present, moves to `Connecting` and opens the group's
    /// channel. The transition to `Connected` (or back to `Disconnected` on
    /// handshake failure) arrives through the transport's event stream. A
    /// session that cannot even derive its endpoint is logged and left
    /// `Disconnected`; nothing propagates to the caller beyond the status.
    pub fn spawn_with_connector(
        config: &ChatConfig,
        session: SessionConfig,
        connector: &dyn Connector,
    ) -> Self {
        let shared = Arc::new(SessionShared {
            state: Mutex::new(SessionState::seeded(&session.initial_messages)),
            status: Mutex::new(ConnectionStatus::Disconnected),
            updates: broadcast::channel(UPDATE_BUFFER_SIZE).0,
        });

        // Without a local user the session is a read-only snapshot.
        let Some(user_id) = session.current_user_id else {
            tracing::debug!(
                target: "learnify_chat::session",
                "No local user; opening group {} read-only",
                session.group_id
            );
            return Self {
                group_id: session.group_id,
                user_id: None,
                user_name: session.current_user_name,
                shared,
                outbound: None,
                driver: None,
            };
        };

        let endpoint = match config.ws_endpoint(&session.group_id) {
            Ok(endpoint) => endpoint,
            Err(error) => {
                tracing::error!(
                    target: "learnify_chat::session",
                    "Cannot derive chat endpoint for group {}: {}",
                    session.group_id,
                    error
                );
                return Self {
                    group_id: session.group_id,
                    user_id: Some(user_id),
                    user_name: session.current_user_name,
                    shared,
                    outbound: None,
                    driver: None,
                };
            }
        };

        shared.set_status(ConnectionStatus::Connecting);

        let handle = connector.open(endpoint);
        let driver = tokio::spawn(drive(
            Arc::clone(&shared),
            handle.events,
            session.group_id.clone(),
        ));

        Self {
            group_id: session.group_id,
            user_id: Some(user_id),
            user_name: session.current_user_name,
            shared,
            outbound: Some(handle.outbound),
            driver: Some(driver),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Current connection status. Callers should disable their send
    /// affordance whenever this is not [`ConnectionStatus::Connected`].
    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.lock().unwrap()
    }

    /// Snapshot of the rendered message list, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.state.lock().unwrap().messages().to_vec()
    }

    /// Subscribe to incremental updates (appends, in-place replacements,
    /// status changes).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.shared.updates.subscribe()
    }

    /// Send a message to the group.
    ///
    /// The trimmed content is appended to the rendered list immediately as an
    /// optimistic entry and a send frame goes out on the live connection; the
    /// server echo later replaces the optimistic entry in place.
    ///
    /// Blank content, a read-only session, and a session that is not
    /// `Connected` are all silent no-ops; sends are never queued. A
    /// transmission failure after the optimistic append is returned as an
    /// error and the optimistic entry is left in the list.
    pub async fn send(&self, content: &str) -> Result<()> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let (Some(user_id), Some(outbound)) = (&self.user_id, &self.outbound) else {
            tracing::debug!(
                target: "learnify_chat::session",
                "Ignoring send without a user or transport for group {}",
                self.group_id
            );
            return Ok(());
        };

        if self.status() != ConnectionStatus::Connected {
            tracing::debug!(
                target: "learnify_chat::session",
                "Ignoring send while not connected to group {}",
                self.group_id
            );
            return Ok(());
        }

        let sender_name = self.local_display_name();
        let timestamp = frame::wire_timestamp_now();

        let optimistic = self.shared.state.lock().unwrap().push_optimistic(
            user_id,
            &sender_name,
            trimmed,
            &timestamp,
        );
        let _ = self
            .shared
            .updates
            .send(SessionUpdate::MessageAppended(optimistic));

        let payload = serde_json::to_string(&OutboundFrame {
            sender_id: user_id,
            content: trimmed,
        })?;

        outbound.send(payload).await.map_err(|_| {
            tracing::warn!(
                target: "learnify_chat::session",
                "Transport rejected send for group {}",
                self.group_id
            );
            ChatError::SendFailed("transport is no longer accepting frames".to_string())
        })
    }

    /// Tear the session down: close the transport and stop processing. Any
    /// unconfirmed optimistic sends are discarded with the session state.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn local_display_name(&self) -> String {
        match &self.user_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => match &self.user_id {
                Some(user_id) => user_id.clone(),
                None => LOCAL_FALLBACK_NAME.to_string(),
            },
        }
    }

    fn teardown(&mut self) {
        // Dropping the outbound sender makes the connection task send a close
        // frame and exit.
        self.outbound.take();
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        self.shared.set_status(ConnectionStatus::Disconnected);
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("group_id", &self.group_id)
            .field("user_id", &self.user_id)
            .field("status", &self.status())
            .finish()
    }
}

/// Consume transport events in delivery order and apply them to the session.
async fn drive(
    shared: Arc<SessionShared>,
    mut events: mpsc::Receiver<TransportEvent>,
    group_id: String,
) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::Opened => {
                tracing::debug!(
                    target: "learnify_chat::session",
                    "Connected to group {}",
                    group_id
                );
                shared.set_status(ConnectionStatus::Connected);
            }
            TransportEvent::Frame(raw) => {
                // Frames are not buffered across the handshake; anything that
                // arrives before Opened is dropped.
                if *shared.status.lock().unwrap() != ConnectionStatus::Connected {
                    tracing::debug!(
                        target: "learnify_chat::session",
                        "Dropping frame received while not connected to group {}",
                        group_id
                    );
                    continue;
                }

                let message = match frame::resolve_frame(&raw) {
                    Ok(message) => message,
                    Err(error) => {
                        tracing::warn!(
                            target: "learnify_chat::session",
                            "Discarding malformed frame on group {}: {}",
                            group_id,
                            error
                        );
                        continue;
                    }
                };

                let outcome = shared.state.lock().unwrap().apply_inbound(message);
                match outcome {
                    InboundOutcome::ReplacedOptimistic { index, message } => {
                        let _ = shared
                            .updates
                            .send(SessionUpdate::MessageReplaced { index, message });
                    }
                    InboundOutcome::Appended(message) => {
                        let _ = shared.updates.send(SessionUpdate::MessageAppended(message));
                    }
                    InboundOutcome::DroppedDuplicate => {
                        tracing::debug!(
                            target: "learnify_chat::session",
                            "Dropped duplicate frame on group {}",
                            group_id
                        );
                    }
                }
            }
            TransportEvent::Errored(reason) => {
                tracing::warn!(
                    target: "learnify_chat::session",
                    "Transport error on group {}: {}",
                    group_id,
                    reason
                );
                shared.set_status(ConnectionStatus::Disconnected);
            }
            TransportEvent::Closed => {
                tracing::debug!(
                    target: "learnify_chat::session",
                    "Transport closed for group {}",
                    group_id
                );
                shared.set_status(ConnectionStatus::Disconnected);
            }
        }
    }
}
