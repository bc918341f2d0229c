use serde::{Deserialize, Serialize};

/// A single chat entry, in the shape the backend serializes and the UI renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Opaque identifier of the sending user
    pub sender: String,

    /// Human-readable name of the sender, when the backend knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,

    /// Message body
    pub content: String,

    /// ISO-8601 instant, kept exactly as received
    pub timestamp: String,
}

impl ChatMessage {
    /// Name to render for this message, falling back to the sender id when
    /// no usable display name is present.
    pub fn display_name(&self) -> &str {
        match &self.sender_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.sender,
        }
    }
}

/// Connection lifecycle of a live session.
///
/// There is no automatic reconnect: once a session reaches `Disconnected`,
/// recovery means dropping it and spawning a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Bookkeeping for one optimistic send awaiting its server echo.
///
/// `sender_id` and `content` form the match key against inbound frames; the
/// `optimistic_*` fields and `local_timestamp` pin down the exact placeholder
/// entry in the rendered list so the echo can replace it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingSend {
    pub sender_id: String,
    pub content: String,
    pub optimistic_sender_id: String,
    pub optimistic_sender_name: String,
    pub local_timestamp: String,
}

/// Incremental update pushed to session subscribers.
///
/// The rendered list only ever changes in these three ways, so a subscriber
/// can mirror it without re-fetching the full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionUpdate {
    /// The connection status changed.
    StatusChanged(ConnectionStatus),

    /// A message was appended at the end of the list.
    MessageAppended(ChatMessage),

    /// The entry at `index` was replaced by its server-confirmed version.
    MessageReplaced { index: usize, message: ChatMessage },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_with_name(name: Option<&str>) -> ChatMessage {
        ChatMessage {
            sender: "u1".to_string(),
            sender_name: name.map(str::to_string),
            content: "hola".to_string(),
            timestamp: "2026-03-01T10:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_display_name_prefers_sender_name() {
        assert_eq!(message_with_name(Some("Ana García")).display_name(), "Ana García");
    }

    #[test]
    fn test_display_name_falls_back_to_sender() {
        assert_eq!(message_with_name(None).display_name(), "u1");
        assert_eq!(message_with_name(Some("   ")).display_name(), "u1");
        assert_eq!(message_with_name(Some("")).display_name(), "u1");
    }

    #[test]
    fn test_chat_message_serialization_roundtrip() {
        let message = message_with_name(Some("Ana"));
        let serialized = serde_json::to_string(&message).expect("serialize");
        let deserialized: ChatMessage = serde_json::from_str(&serialized).expect("deserialize");
        assert_eq!(message, deserialized);
    }

    #[test]
    fn test_chat_message_deserializes_without_sender_name() {
        let raw = r#"{"sender":"u1","content":"hola","timestamp":"2026-03-01T10:00:00.000Z"}"#;
        let message: ChatMessage = serde_json::from_str(raw).expect("deserialize");
        assert_eq!(message.sender_name, None);
        assert_eq!(message.display_name(), "u1");
    }

    #[test]
    fn test_connection_status_serializes_lowercase() {
        let serialized = serde_json::to_string(&ConnectionStatus::Connecting).expect("serialize");
        assert_eq!(serialized, "\"connecting\"");
    }
}
