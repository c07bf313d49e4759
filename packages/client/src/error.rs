//! Error types for the playback synchronization client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Participant ID is already in use in the room
    #[error("Participant ID '{0}' is already connected to this room")]
    DuplicateParticipantId(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Clock sync failed: {0}")]
    ClockSync(#[from] ClockSyncError),

    #[error("Failed to fetch media list: {0}")]
    MediaList(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A failed probe against the reference time source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockSyncError {
    #[error("Probe request failed: {0}")]
    Request(String),

    #[error("Invalid probe response: {0}")]
    InvalidResponse(String),
}
