//! In-process media element.
//!
//! A virtual playhead that advances with a monotonic clock while playing and
//! not buffering. Cloning yields another handle to the same element, so the
//! console can act on it like a user while the engine drives it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::{sync::mpsc, time::Instant};

use super::{MediaElement, MediaEvent, PlayerStatus};

#[derive(Debug)]
struct ElementState {
    paused: bool,
    buffering: bool,
    /// Playhead as of `anchor`
    position: f64,
    anchor: Instant,
    source: Option<String>,
    events: mpsc::UnboundedSender<MediaEvent>,
}

impl ElementState {
    fn current_time(&self) -> f64 {
        if self.paused || self.buffering {
            self.position
        } else {
            self.position + self.anchor.elapsed().as_secs_f64()
        }
    }

    fn settle(&mut self) {
        self.position = self.current_time();
        self.anchor = Instant::now();
    }

    fn emit(&self, event: MediaEvent) {
        // Nobody listening is fine: the engine may already be gone
        let _ = self.events.send(event);
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedElement {
    state: Arc<Mutex<ElementState>>,
}

impl SimulatedElement {
    /// A paused element at position 0 and the receiver of its events
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MediaEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let element = Self {
            state: Arc::new(Mutex::new(ElementState {
                paused: true,
                buffering: false,
                position: 0.0,
                anchor: Instant::now(),
                source: None,
                events: tx,
            })),
        };
        (element, rx)
    }

    /// Simulate a stall (`Waiting`) or recovery (`CanPlay`)
    pub fn set_buffering(&self, buffering: bool) {
        let mut state = self.lock();
        if state.buffering == buffering {
            return;
        }
        state.settle();
        state.buffering = buffering;
        state.emit(if buffering {
            MediaEvent::Waiting
        } else {
            MediaEvent::CanPlay
        });
    }

    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        // The state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MediaElement for SimulatedElement {
    fn status(&self) -> PlayerStatus {
        let state = self.lock();
        PlayerStatus {
            paused: state.paused,
            current_time: state.current_time(),
            buffering: state.buffering,
        }
    }

    fn play(&self) {
        let mut state = self.lock();
        if state.paused {
            state.settle();
            state.paused = false;
            state.emit(MediaEvent::Play);
        }
    }

    fn pause(&self) {
        let mut state = self.lock();
        if !state.paused {
            state.settle();
            state.paused = true;
            state.emit(MediaEvent::Pause);
        }
    }

    fn seek(&self, time: f64) {
        let mut state = self.lock();
        let time = time.max(0.0);
        state.position = time;
        state.anchor = Instant::now();
        state.emit(MediaEvent::Seeking(time));
    }

    fn load_source(&self, source: &str) {
        let mut state = self.lock();
        state.source = Some(source.to_string());
        state.position = 0.0;
        state.anchor = Instant::now();
        state.paused = true;
    }
}
