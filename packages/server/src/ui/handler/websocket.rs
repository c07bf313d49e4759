//! WebSocket connection handlers.
//!
//! One connection is one participant of one room:
//!
//! 1. The upgrade request is validated and the participant joins the room
//!    (`409 Conflict` for a duplicate participant id).
//! 2. The newcomer receives `room-connected`; the others receive `join`.
//! 3. Incoming frames are relayed until the socket closes or stays silent for
//!    the idle timeout (clients send a heartbeat every second).
//! 4. The participant leaves and the others receive `leave`.

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use tandem_shared::protocol::WireMessage;

use crate::{
    domain::{ParticipantId, ParticipantIdFactory, RoomId},
    ui::state::AppState,
    usecase::{JoinError, LeaveError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// Assigned by the server when omitted
    pub participant_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Model
    let room_id = RoomId::try_from(room_id).map_err(|e| {
        tracing::warn!("Invalid room_id: {}", e);
        StatusCode::BAD_REQUEST
    })?;
    let participant_id = match query.participant_id {
        Some(id) => ParticipantId::try_from(id).map_err(|e| {
            tracing::warn!("Invalid participant_id: {}", e);
            StatusCode::BAD_REQUEST
        })?,
        None => ParticipantIdFactory::generate().map_err(|e| {
            tracing::error!("Failed to generate participant_id: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?,
    };

    // Create a channel for this participant to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    match state
        .join_room_usecase
        .execute(&room_id, &participant_id, tx)
        .await
    {
        Ok(joined_at) => {
            tracing::info!(
                "Participant '{}' joined room '{}' at {}",
                participant_id,
                room_id,
                joined_at.value()
            );

            // The participant is already registered; undo that if the handshake never completes
            let failed_state = state.clone();
            let failed_room_id = room_id.clone();
            let failed_participant_id = participant_id.clone();

            Ok(ws
                .on_failed_upgrade(move |e| {
                    tracing::warn!(
                        "WebSocket upgrade failed for '{}': {}",
                        failed_participant_id,
                        e
                    );
                    tokio::spawn(async move {
                        leave(&failed_state, &failed_room_id, &failed_participant_id).await;
                    });
                })
                .on_upgrade(move |socket| handle_socket(socket, state, room_id, participant_id, rx)))
        }
        Err(JoinError::DuplicateParticipantId(_)) => {
            tracing::warn!(
                "Participant '{}' is already in room '{}'. Rejecting connection.",
                participant_id,
                room_id
            );
            Err(StatusCode::CONFLICT)
        }
        Err(e) => {
            tracing::error!("Failed to join room '{}': {}", room_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    room_id: RoomId,
    participant_id: ParticipantId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    // Outbound messages are queued in rx until this task drains them
    let mut send_task = pusher_loop(rx, sender);

    match state
        .join_room_usecase
        .announce(&room_id, &participant_id)
        .await
    {
        Ok(report) => tracing::info!(
            "Announced '{}' to {} participant(s) in room '{}'",
            participant_id,
            report.delivered.len(),
            room_id
        ),
        Err(e) => tracing::warn!("Failed to announce '{}': {}", participant_id, e),
    }

    let recv_state = state.clone();
    let recv_room_id = room_id.clone();
    let recv_participant_id = participant_id.clone();
    let idle_timeout = state.idle_timeout;

    // Spawn a task to receive messages from this participant
    let mut recv_task = tokio::spawn(async move {
        loop {
            let msg = match tokio::time::timeout(idle_timeout, receiver.next()).await {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(e))) => {
                    tracing::warn!("WebSocket error from '{}': {}", recv_participant_id, e);
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "No frame from '{}' for {:?}; closing the connection",
                        recv_participant_id,
                        idle_timeout
                    );
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    relay_text(
                        &recv_state,
                        &recv_room_id,
                        &recv_participant_id,
                        text.as_str(),
                    )
                    .await;
                }
                Message::Binary(data) => {
                    tracing::warn!(
                        "Dropping binary frame ({} bytes) from '{}'",
                        data.len(),
                        recv_participant_id
                    );
                }
                Message::Close(_) => {
                    tracing::info!("Participant '{}' requested close", recv_participant_id);
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    leave(&state, &room_id, &participant_id).await;
}

/// Handle one text frame from `participant_id`.
///
/// Only the message type is inspected: heartbeats are answered, state snapshots
/// are forwarded, anything else is a protocol fault and is dropped.
async fn relay_text(
    state: &AppState,
    room_id: &RoomId,
    participant_id: &ParticipantId,
    text: &str,
) {
    let message = match WireMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Dropping message from '{}': {}", participant_id, e);
            return;
        }
    };

    match message {
        WireMessage::Heartbeat => {
            if let Err(e) = state
                .relay_message_usecase
                .echo(room_id, participant_id, text)
                .await
            {
                tracing::warn!("Failed to answer heartbeat of '{}': {}", participant_id, e);
            }
        }
        WireMessage::State(mut snapshot) => {
            let payload = if snapshot.participant_id == participant_id.as_str() {
                text.to_string()
            } else {
                // The connection identity wins over whatever the client put in the frame
                tracing::warn!(
                    "State from '{}' claimed to be from '{}'",
                    participant_id,
                    snapshot.participant_id
                );
                snapshot.participant_id = participant_id.as_str().to_string();
                match WireMessage::State(snapshot).to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to encode state message: {}", e);
                        return;
                    }
                }
            };

            if let Err(e) = state
                .relay_message_usecase
                .execute(room_id, participant_id, &payload)
                .await
            {
                tracing::warn!("Failed to relay state from '{}': {}", participant_id, e);
            }
        }
        other => {
            tracing::warn!(
                "Dropping '{}' message from '{}': only the server sends it",
                other.kind(),
                participant_id
            );
        }
    }
}

async fn leave(state: &AppState, room_id: &RoomId, participant_id: &ParticipantId) {
    match state
        .leave_room_usecase
        .execute(room_id, participant_id)
        .await
    {
        Ok(report) => tracing::info!(
            "Participant '{}' left room '{}' ({} notified)",
            participant_id,
            room_id,
            report.delivered.len()
        ),
        Err(LeaveError::NotInRoom(_)) => tracing::debug!(
            "Participant '{}' was already removed from room '{}'",
            participant_id,
            room_id
        ),
    }
}
