//! Tandem room relay server.
//!
//! The relay fans out playback events to the other participants of a room.
//! It never interprets playback state; clients converge among themselves.
//!
//! Layers:
//!
//! - [`domain`]: value objects, entities and the traits the other layers depend on
//! - [`infrastructure`]: in-memory membership table, WebSocket pusher, media list, DTOs
//! - [`usecase`]: join, leave, relay and read-only queries
//! - [`ui`]: axum router and handlers

pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
