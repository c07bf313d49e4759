//! Wire messages exchanged over the room WebSocket.
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! ```text
//! {"type":"join","participantId":"alice"}
//! {"type":"leave","participantId":"alice"}
//! {"type":"heartbeat"}
//! {"type":"state","paused":false,"videoTime":12.5,"bufferingCount":0,
//!  "mediaIndex":0,"updateTime":1700000000.25,"participantId":"alice","buffering":false}
//! {"type":"room-connected","participantId":"alice","participants":["alice","bob"]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tag values accepted in the `type` field
pub const MESSAGE_TYPES: [&str; 5] = ["join", "leave", "heartbeat", "state", "room-connected"];

/// A participant arrival or departure relayed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEvent {
    pub participant_id: String,
}

/// Full playback snapshot published by one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMessage {
    pub paused: bool,
    /// Media position in seconds, valid as of `update_time`
    pub video_time: f64,
    pub buffering_count: u32,
    pub media_index: u32,
    /// Logical timestamp (seconds) of the last mutation
    pub update_time: f64,
    pub participant_id: String,
    /// Whether the sender itself is currently buffering
    #[serde(default)]
    pub buffering: bool,
}

/// Sent by the server to a newcomer right after the upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConnectedMessage {
    /// The id the server registered this connection under
    pub participant_id: String,
    /// Every member of the room, the newcomer included
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WireMessage {
    Join(ParticipantEvent),
    Leave(ParticipantEvent),
    Heartbeat,
    State(StateMessage),
    RoomConnected(RoomConnectedMessage),
}

/// Errors raised while decoding a frame
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Message has no 'type' field")]
    MissingType,

    #[error("Unknown message type '{0}'")]
    UnknownType(String),

    #[error("Invalid '{kind}' message: {reason}")]
    InvalidField { kind: String, reason: String },

    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl WireMessage {
    pub fn join(participant_id: impl Into<String>) -> Self {
        WireMessage::Join(ParticipantEvent {
            participant_id: participant_id.into(),
        })
    }

    pub fn leave(participant_id: impl Into<String>) -> Self {
        WireMessage::Leave(ParticipantEvent {
            participant_id: participant_id.into(),
        })
    }

    /// Value of the `type` tag for this message
    pub fn kind(&self) -> &'static str {
        match self {
            WireMessage::Join(_) => "join",
            WireMessage::Leave(_) => "leave",
            WireMessage::Heartbeat => "heartbeat",
            WireMessage::State(_) => "state",
            WireMessage::RoomConnected(_) => "room-connected",
        }
    }

    /// Decode a text frame.
    ///
    /// The tag is checked before the body so that callers can tell an unknown
    /// message kind apart from a known kind with bad fields.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) | None => return Err(ProtocolError::MissingType),
        };
        if !MESSAGE_TYPES.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownType(kind));
        }

        let message: WireMessage =
            serde_json::from_value(value).map_err(|e| ProtocolError::InvalidField {
                kind: kind.clone(),
                reason: e.to_string(),
            })?;
        message.validate()?;
        Ok(message)
    }

    /// Encode as a JSON text frame
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        let invalid = |reason: &str| ProtocolError::InvalidField {
            kind: self.kind().to_string(),
            reason: reason.to_string(),
        };

        match self {
            WireMessage::Join(event) | WireMessage::Leave(event) => {
                if event.participant_id.is_empty() {
                    return Err(invalid("participantId must not be empty"));
                }
            }
            WireMessage::State(state) => {
                if !state.video_time.is_finite() || state.video_time < 0.0 {
                    return Err(invalid("videoTime must be a non-negative number"));
                }
                if !state.update_time.is_finite() || state.update_time < 0.0 {
                    return Err(invalid("updateTime must be a non-negative number"));
                }
            }
            WireMessage::Heartbeat | WireMessage::RoomConnected(_) => {}
        }
        Ok(())
    }
}
