//! Typed-event seam between a live session and its WebSocket.
//!
//! A [`Connector`] hands the session two channel ends and nothing else: a
//! sender for serialized outbound frames and a receiver of
//! [`TransportEvent`]s. The session consumes the receiver from a single task,
//! so inbound ordering is exactly the order the transport produced events in.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

const CHANNEL_CAPACITY: usize = 100;

/// Lifecycle and data events a transport pushes at the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection handshake completed.
    Opened,

    /// One text frame arrived.
    Frame(String),

    /// The transport failed; no further frames will arrive.
    Errored(String),

    /// The peer closed the connection.
    Closed,
}

/// Live halves of one transport connection.
#[derive(Debug)]
pub struct TransportHandle {
    /// Accepts serialized frames for transmission. Sends fail once the
    /// connection task has exited.
    pub outbound: mpsc::Sender<String>,

    /// Yields events strictly in production order, starting with either
    /// [`TransportEvent::Opened`] or [`TransportEvent::Errored`].
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Opens transport connections for live sessions.
///
/// `open` must not block: it hands back the channel ends immediately and
/// reports the handshake result as the first event.
pub trait Connector: Send + Sync {
    fn open(&self, endpoint: String) -> TransportHandle;
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Debug, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(&self, endpoint: String) -> TransportHandle {
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(run_connection(endpoint, event_tx, outbound_rx));

        TransportHandle {
            outbound: outbound_tx,
            events: event_rx,
        }
    }
}

async fn run_connection(
    endpoint: String,
    events: mpsc::Sender<TransportEvent>,
    mut outbound: mpsc::Receiver<String>,
) {
    let (ws, _response) = match connect_async(endpoint.as_str()).await {
        Ok(connection) => connection,
        Err(error) => {
            tracing::warn!(
                target: "learnify_chat::transport",
                "Failed to connect to {}: {}",
                endpoint,
                error
            );
            let _ = events.send(TransportEvent::Errored(error.to_string())).await;
            return;
        }
    };

    if events.send(TransportEvent::Opened).await.is_err() {
        // Session torn down before the handshake finished.
        return;
    }

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(error) = sink.send(WsMessage::Text(frame)).await {
                            tracing::warn!(
                                target: "learnify_chat::transport",
                                "Send failed on {}: {}",
                                endpoint,
                                error
                            );
                            let _ = events.send(TransportEvent::Errored(error.to_string())).await;
                            break;
                        }
                    }
                    // Session dropped its outbound sender: teardown.
                    None => {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        break;
                    }
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if events.send(TransportEvent::Frame(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        let _ = events.send(TransportEvent::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong are answered by tungstenite; binary frames
                        // are not part of the chat protocol.
                    }
                    Some(Err(error)) => {
                        let _ = events.send(TransportEvent::Errored(error.to_string())).await;
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ws_connector_reports_connect_failure_as_event() {
        let connector = WsConnector;
        // Nothing listens here; the handshake must fail and surface as an
        // Errored event rather than a panic or a hang.
        let mut handle = connector.open("ws://127.0.0.1:1/study-groups/ws/g1".to_string());

        match handle.events.recv().await {
            Some(TransportEvent::Errored(_)) => {}
            other => panic!("expected Errored event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_outbound_send_fails_after_connection_task_exits() {
        let connector = WsConnector;
        let mut handle = connector.open("ws://127.0.0.1:1/study-groups/ws/g1".to_string());

        // Wait for the connection task to give up.
        let _ = handle.events.recv().await;
        assert!(handle.events.recv().await.is_none());

        let result = handle.outbound.send("{}".to_string()).await;
        assert!(result.is_err());
    }
}
