//! Data Transfer Objects (DTOs) for the HTTP API.
//!
//! WebSocket messages are defined in `tandem_shared::protocol`, which the client shares.

pub mod conversion;
pub mod http;
