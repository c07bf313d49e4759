//! Shared building blocks for the Tandem server and client.
//!
//! - [`logger`]: tracing subscriber setup used by both binaries
//! - [`time`]: clock abstraction and timestamp helpers
//! - [`protocol`]: the JSON wire messages exchanged over the room WebSocket

pub mod logger;
pub mod protocol;
pub mod time;
