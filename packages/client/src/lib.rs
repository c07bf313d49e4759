//! Tandem playback synchronization client.
//!
//! [`engine::SyncEngine`] keeps a local media element in step with the other
//! participants of a room on a Tandem relay server.

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod media;
pub mod peers;
pub mod player;
pub mod reconcile;
pub mod runner;
pub mod session;
pub mod snapshot;
pub mod synchronizer;
pub mod ui;

pub use runner::run_client;
