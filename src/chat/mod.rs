//! Live Group Chat Module
//!
//! This module owns one live chat session per mounted group view: the
//! rendered message list, optimistic sends and their reconciliation against
//! server echoes, duplicate suppression, and the connection lifecycle over a
//! group-scoped WebSocket channel.

mod frame;
mod session;
mod state;
mod transport;
mod types;

pub use session::{ChatSession, SessionConfig};
pub use transport::{Connector, TransportEvent, TransportHandle, WsConnector};
pub use types::{ChatMessage, ConnectionStatus, SessionUpdate};
