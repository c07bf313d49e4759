//! Client configuration.
//!
//! The server is addressed by its HTTP base URL; the WebSocket, clock and
//! media list endpoints are derived from it.

use std::time::Duration;

use crate::error::ClientError;

pub const DEFAULT_CLOCK_SYNC_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_TOLERANCE_SECS: f64 = 0.5;
pub const DEFAULT_PENDING_COMMAND_TTL: Duration = Duration::from_secs(2);

/// Longest room or participant id the relay accepts
pub const MAX_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// `http://host:port` or `https://host:port`, without a trailing slash
    pub server_url: String,
    pub room_id: String,
    pub participant_id: String,
    pub clock_sync_interval: Duration,
    pub heartbeat_interval: Duration,
    pub reconcile_interval: Duration,
    pub reconnect_backoff: Duration,
    /// Allowed distance in seconds between the local playhead and the target
    pub tolerance: f64,
    /// How long a silent command waits for its element event
    pub pending_command_ttl: Duration,
    /// `None` retries forever
    pub max_reconnect_attempts: Option<u32>,
}

impl ClientConfig {
    /// Create a configuration with default timings
    pub fn new(
        server_url: impl Into<String>,
        room_id: impl Into<String>,
        participant_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        if !(server_url.starts_with("http://") || server_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "server URL must start with http:// or https://, got '{}'",
                server_url
            )));
        }

        let room_id = room_id.into();
        validate_id("room id", &room_id)?;
        let participant_id = participant_id.into();
        validate_id("participant id", &participant_id)?;

        Ok(Self {
            server_url,
            room_id,
            participant_id,
            clock_sync_interval: DEFAULT_CLOCK_SYNC_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            tolerance: DEFAULT_TOLERANCE_SECS,
            pending_command_ttl: DEFAULT_PENDING_COMMAND_TTL,
            max_reconnect_attempts: None,
        })
    }

    /// `ws(s)://.../api/v1/rooms/{room_id}/ws?participant_id=...`
    pub fn ws_url(&self) -> String {
        let base = if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.server_url.clone()
        };
        format!(
            "{}/api/v1/rooms/{}/ws?participant_id={}",
            base, self.room_id, self.participant_id
        )
    }

    pub fn clock_url(&self) -> String {
        format!("{}/api/v1/clock", self.server_url)
    }

    pub fn media_url(&self) -> String {
        format!("{}/api/v1/rooms/{}/media", self.server_url, self.room_id)
    }
}

/// Room and participant ids go into the URL unescaped, so they are held to the
/// relay's `[A-Za-z0-9_-]{1,64}`
fn validate_id(kind: &str, value: &str) -> Result<(), ClientError> {
    if value.is_empty() || value.chars().count() > MAX_ID_LEN {
        return Err(ClientError::InvalidConfig(format!(
            "{} must be 1 to {} characters, got '{}'",
            kind, MAX_ID_LEN, value
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(ClientError::InvalidConfig(format!(
            "{} '{}' contains '{}'; only letters, digits, '_' and '-' are allowed",
            kind, value, c
        )));
    }
    Ok(())
}
