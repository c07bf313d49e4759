//! WebSocket session with the relay server.
//!
//! A [`Connection`] owns one task that connects, then pumps frames both ways
//! until the socket closes. Everything it observes is reported to the engine
//! as a [`TransportEvent`] tagged with the connection's generation, so events
//! from a replaced connection can be told apart.

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Error as WsError, http::StatusCode, protocol::Message},
};

use tandem_shared::protocol::WireMessage;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected {
        generation: u64,
    },
    Message {
        generation: u64,
        message: WireMessage,
    },
    Closed {
        generation: u64,
        reason: String,
    },
    ConnectFailed {
        generation: u64,
        error: ClientError,
    },
    /// The reconnect backoff has elapsed
    RetryDue {
        generation: u64,
    },
}

impl TransportEvent {
    pub fn generation(&self) -> u64 {
        match self {
            TransportEvent::Connected { generation }
            | TransportEvent::Message { generation, .. }
            | TransportEvent::Closed { generation, .. }
            | TransportEvent::ConnectFailed { generation, .. }
            | TransportEvent::RetryDue { generation } => *generation,
        }
    }
}

pub struct Connection {
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Connection {
    /// Start connecting to `url` in the background
    pub fn open(
        url: String,
        participant_id: String,
        generation: u64,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_session(
            url,
            participant_id,
            generation,
            events,
            outbound_rx,
        ));
        Self { outbound, task }
    }

    /// Queue a message; returns `false` if the session has ended
    pub fn send(&self, message: &WireMessage) -> bool {
        match message.to_json() {
            Ok(json) => self.outbound.send(json).is_ok(),
            Err(e) => {
                tracing::error!("Failed to encode {} message: {}", message.kind(), e);
                false
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Open the WebSocket, mapping `409 Conflict` to a duplicate participant id
/// and `400 Bad Request` to an invalid configuration
pub async fn connect(
    url: &str,
    participant_id: &str,
) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, ClientError> {
    match connect_async(url).await {
        Ok((ws_stream, _response)) => Ok(ws_stream),
        Err(WsError::Http(response)) if response.status() == StatusCode::CONFLICT => Err(
            ClientError::DuplicateParticipantId(participant_id.to_string()),
        ),
        Err(WsError::Http(response)) if response.status() == StatusCode::BAD_REQUEST => {
            Err(ClientError::InvalidConfig(format!(
                "the relay rejected the room or participant id ({})",
                url
            )))
        }
        Err(e) => Err(ClientError::ConnectionError(e.to_string())),
    }
}

async fn run_session(
    url: String,
    participant_id: String,
    generation: u64,
    events: mpsc::UnboundedSender<TransportEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let ws_stream = match connect(&url, &participant_id).await {
        Ok(ws_stream) => ws_stream,
        Err(error) => {
            let _ = events.send(TransportEvent::ConnectFailed { generation, error });
            return;
        }
    };

    tracing::info!("Connected to {} as '{}'", url, participant_id);
    if events
        .send(TransportEvent::Connected { generation })
        .is_err()
    {
        return;
    }

    let (mut write, mut read) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => match WireMessage::parse(text.as_str()) {
                    Ok(message) => {
                        if events
                            .send(TransportEvent::Message { generation, message })
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(e) => tracing::warn!("Dropping message from server: {}", e),
                },
                Some(Ok(Message::Binary(data))) => {
                    tracing::warn!("Dropping binary frame ({} bytes) from server", data.len());
                }
                Some(Ok(Message::Close(_))) => break "Server closed the connection".to_string(),
                Some(Ok(_)) => {}
                Some(Err(e)) => break format!("WebSocket read error: {}", e),
                None => break "Connection lost".to_string(),
            },
            outgoing = outbound.recv() => match outgoing {
                Some(json) => {
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        break format!("WebSocket write error: {}", e);
                    }
                }
                None => {
                    // The engine dropped the connection
                    let _ = write.close().await;
                    return;
                }
            },
        }
    };

    tracing::warn!("Session '{}' ended: {}", participant_id, reason);
    let _ = events.send(TransportEvent::Closed { generation, reason });
}
