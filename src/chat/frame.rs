//! Wire-frame resolution for the group chat channel.
//!
//! Inbound frames are loose JSON: the backend has spelled the sender field
//! `sender` or `sender_id` across versions, and the display name may arrive
//! as `sender_name`, `sender_full_name`, or not at all. Resolution keeps the
//! fallback chain in one pure function so the session never sees a partial
//! frame.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::types::ChatMessage;
use crate::error::Result;

/// Sender id recorded when a frame carries no usable sender field.
pub(crate) const UNKNOWN_SENDER: &str = "unknown";

/// Display name recorded when every name fallback is missing.
pub(crate) const UNKNOWN_SENDER_NAME: &str = "Usuario desconocido";

/// Outbound send frame. The channel protocol wants exactly the sender id and
/// the message body; the server stamps everything else.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(crate) struct OutboundFrame<'a> {
    pub sender_id: &'a str,
    pub content: &'a str,
}

/// Current instant in the wire timestamp format (RFC 3339, millisecond
/// precision, UTC).
pub(crate) fn wire_timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolve a raw inbound frame into a renderable message.
///
/// Missing fields resolve to defaults rather than rejecting the frame:
/// the sender falls back through `sender_id`, `sender`, then
/// [`UNKNOWN_SENDER`]; the name through `sender_name`, `sender_full_name`,
/// `sender`, then [`UNKNOWN_SENDER_NAME`]; missing content becomes the empty
/// string and a missing timestamp is stamped with the receipt time. Only
/// input that is not JSON at all is an error.
pub(crate) fn resolve_frame(raw: &str) -> Result<ChatMessage> {
    let value: Value = serde_json::from_str(raw)?;

    let sender = string_field(&value, "sender_id")
        .or_else(|| string_field(&value, "sender"))
        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

    let sender_name = string_field(&value, "sender_name")
        .or_else(|| string_field(&value, "sender_full_name"))
        .or_else(|| string_field(&value, "sender"))
        .unwrap_or_else(|| UNKNOWN_SENDER_NAME.to_string());

    let content = string_field(&value, "content").unwrap_or_default();

    let timestamp = string_field(&value, "timestamp").unwrap_or_else(wire_timestamp_now);

    Ok(ChatMessage {
        sender,
        sender_name: Some(sender_name),
        content,
        timestamp,
    })
}

/// Non-empty string field lookup. Empty strings count as absent so they fall
/// through to the next candidate, matching how the backend's older clients
/// treated them.
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_full_frame() {
        let raw = r#"{
            "type": "message",
            "sender_id": "u1",
            "sender": "u1",
            "sender_name": "Ana García",
            "content": "hola",
            "timestamp": "2026-03-01T10:00:00.000Z"
        }"#;

        let message = resolve_frame(raw).unwrap();
        assert_eq!(message.sender, "u1");
        assert_eq!(message.sender_name.as_deref(), Some("Ana García"));
        assert_eq!(message.content, "hola");
        assert_eq!(message.timestamp, "2026-03-01T10:00:00.000Z");
    }

    #[test]
    fn test_sender_falls_back_from_sender_id_to_sender() {
        let message = resolve_frame(r#"{"sender":"u2","content":"x"}"#).unwrap();
        assert_eq!(message.sender, "u2");
    }

    #[test]
    fn test_missing_sender_resolves_to_unknown() {
        let message = resolve_frame(r#"{"content":"x"}"#).unwrap();
        assert_eq!(message.sender, UNKNOWN_SENDER);
        assert_eq!(message.sender_name.as_deref(), Some(UNKNOWN_SENDER_NAME));
    }

    #[test]
    fn test_name_falls_back_through_chain() {
        let message =
            resolve_frame(r#"{"sender_id":"u1","sender_full_name":"Ana","content":"x"}"#).unwrap();
        assert_eq!(message.sender_name.as_deref(), Some("Ana"));

        let message = resolve_frame(r#"{"sender_id":"u1","sender":"u1","content":"x"}"#).unwrap();
        assert_eq!(message.sender_name.as_deref(), Some("u1"));
    }

    #[test]
    fn test_empty_string_fields_count_as_absent() {
        let message =
            resolve_frame(r#"{"sender_id":"","sender":"u3","sender_name":"","content":"x"}"#)
                .unwrap();
        assert_eq!(message.sender, "u3");
        assert_eq!(message.sender_name.as_deref(), Some("u3"));
    }

    #[test]
    fn test_missing_content_becomes_empty() {
        let message = resolve_frame(r#"{"sender_id":"u1"}"#).unwrap();
        assert_eq!(message.content, "");
    }

    #[test]
    fn test_missing_timestamp_is_stamped_at_receipt() {
        let message = resolve_frame(r#"{"sender_id":"u1","content":"x"}"#).unwrap();
        assert!(!message.timestamp.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&message.timestamp).is_ok());
    }

    #[test]
    fn test_non_json_input_is_an_error() {
        assert!(resolve_frame("not json").is_err());
    }

    #[test]
    fn test_outbound_frame_serialization() {
        let frame = OutboundFrame {
            sender_id: "u1",
            content: "hola",
        };
        let serialized = serde_json::to_string(&frame).unwrap();
        assert_eq!(serialized, r#"{"sender_id":"u1","content":"hola"}"#);
    }

    #[test]
    fn test_wire_timestamp_is_rfc3339() {
        let stamp = wire_timestamp_now();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
