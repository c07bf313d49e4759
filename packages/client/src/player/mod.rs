//! Media element abstraction.
//!
//! The engine drives an element through [`MediaElement`] and observes it
//! through the [`MediaEvent`]s the element emits, the way a page drives an
//! HTML video element.

mod silenced;
mod simulated;

pub use silenced::{CommandKind, PendingCommands, SilencedPlayer};
pub use simulated::SimulatedElement;

/// What the element is actually doing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStatus {
    pub paused: bool,
    pub current_time: f64,
    pub buffering: bool,
}

/// Native element events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaEvent {
    Play,
    Pause,
    /// A seek to the given position started
    Seeking(f64),
    /// Playback stalled for lack of data
    Waiting,
    /// Enough data to play again
    CanPlay,
}

/// An element event that was not caused by a silent command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserIntent {
    Play,
    Pause,
    Seek(f64),
    StartBuffering,
    StopBuffering,
}

pub trait MediaElement: Send + 'static {
    fn status(&self) -> PlayerStatus;
    fn play(&self);
    fn pause(&self);
    fn seek(&self, time: f64);
    /// Stop the current media and load `source`, paused at the start
    fn load_source(&self, source: &str);
}
