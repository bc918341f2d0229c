//! Session-local message state: the rendered backlog, optimistic sends, and
//! the reconciliation of inbound frames against both.
//!
//! Everything here is synchronous and owned by exactly one session, which
//! keeps the reconciliation rules testable without a socket.

use chrono::{DateTime, NaiveDateTime};

use super::types::{ChatMessage, PendingSend};

/// Two messages from the same sender with the same body whose timestamps are
/// closer together than this are treated as one message arriving twice.
pub(crate) const DUPLICATE_WINDOW_MS: i64 = 1500;

/// What [`SessionState::apply_inbound`] did with a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InboundOutcome {
    /// The frame confirmed an optimistic send; slot `index` now holds the
    /// confirmed message.
    ReplacedOptimistic { index: usize, message: ChatMessage },

    /// The frame was new; it went to the end of the list.
    Appended(ChatMessage),

    /// The frame matched an existing entry inside the duplicate window.
    DroppedDuplicate,
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    messages: Vec<ChatMessage>,
    pending: Vec<PendingSend>,
}

impl SessionState {
    /// Build state from the caller's backlog snapshot. The snapshot is
    /// copied; the caller's vector is never mutated through the session.
    pub(crate) fn seeded(initial: &[ChatMessage]) -> Self {
        Self {
            messages: initial.to_vec(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Append an optimistic placeholder and record how to find it again once
    /// the server echo arrives. Returns the appended message.
    pub(crate) fn push_optimistic(
        &mut self,
        sender_id: &str,
        sender_name: &str,
        content: &str,
        timestamp: &str,
    ) -> ChatMessage {
        let message = ChatMessage {
            sender: sender_id.to_string(),
            sender_name: Some(sender_name.to_string()),
            content: content.to_string(),
            timestamp: timestamp.to_string(),
        };

        self.messages.push(message.clone());
        self.pending.push(PendingSend {
            sender_id: sender_id.to_string(),
            content: content.to_string(),
            optimistic_sender_id: sender_id.to_string(),
            optimistic_sender_name: sender_name.to_string(),
            local_timestamp: timestamp.to_string(),
        });

        message
    }

    /// Reconcile one inbound frame.
    ///
    /// The first pending send whose `(sender_id, content)` matches the frame
    /// claims it as an echo: the pending entry is consumed and the exact
    /// placeholder it recorded is replaced in place, keeping the confirmed
    /// display name unless the server sent a blank one. When no pending entry
    /// matches, or the placeholder is no longer in the list, the frame is
    /// appended unless the duplicate rule rejects it.
    pub(crate) fn apply_inbound(&mut self, incoming: ChatMessage) -> InboundOutcome {
        let pending_index = self
            .pending
            .iter()
            .position(|entry| entry.sender_id == incoming.sender && entry.content == incoming.content);

        if let Some(pending_index) = pending_index {
            let pending = self.pending.remove(pending_index);

            let slot = self.messages.iter().position(|candidate| {
                candidate.content == pending.content
                    && candidate.sender == pending.optimistic_sender_id
                    && candidate.timestamp == pending.local_timestamp
            });

            if let Some(index) = slot {
                let confirmed_name = match &incoming.sender_name {
                    Some(name) if !name.is_empty() => Some(name.clone()),
                    _ => Some(pending.optimistic_sender_name.clone()),
                };
                let confirmed = ChatMessage {
                    sender_name: confirmed_name,
                    ..incoming
                };
                self.messages[index] = confirmed.clone();
                return InboundOutcome::ReplacedOptimistic { index, message: confirmed };
            }
            // Placeholder already gone; fall through to duplicate-checked append.
        }

        if self.already_exists(&incoming) {
            return InboundOutcome::DroppedDuplicate;
        }

        self.messages.push(incoming.clone());
        InboundOutcome::Appended(incoming)
    }

    /// Duplicate rule: same body, same sender, timestamps within
    /// [`DUPLICATE_WINDOW_MS`]. A timestamp that fails to parse on either
    /// side counts as a duplicate.
    fn already_exists(&self, incoming: &ChatMessage) -> bool {
        let incoming_time = parse_instant_millis(&incoming.timestamp);

        self.messages.iter().any(|item| {
            if item.content != incoming.content || item.sender != incoming.sender {
                return false;
            }

            match (incoming_time, parse_instant_millis(&item.timestamp)) {
                (Some(a), Some(b)) => (a - b).abs() < DUPLICATE_WINDOW_MS,
                _ => true,
            }
        })
    }
}

/// Parse a wire timestamp to epoch milliseconds.
///
/// The backend has emitted both RFC 3339 instants and naive datetimes
/// (`str()` of a Python datetime); naive values are taken as UTC.
fn parse_instant_millis(timestamp: &str) -> Option<i64> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(instant.timestamp_millis());
    }

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(timestamp, format)
            .ok()
            .map(|naive| naive.and_utc().timestamp_millis())
    })
}
