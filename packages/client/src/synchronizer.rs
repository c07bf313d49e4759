//! Client synchronizer.
//!
//! Owns the logical clock, the playback snapshot and the peer table of one
//! room membership. Local intents become `state` messages stamped with the
//! logical time; messages from the room are merged last-writer-wins.

use tandem_shared::protocol::WireMessage;

use crate::{
    clock::LogicalClock,
    peers::{PeerStatus, PeerTable},
    snapshot::PlaybackSnapshot,
};

/// What the local player should converge to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    pub paused: bool,
    /// Some peer other than this client is buffering
    pub waiting: bool,
    pub video_time: f64,
    pub media_index: u32,
}

pub struct ClientSynchronizer {
    participant_id: String,
    clock: LogicalClock,
    snapshot: PlaybackSnapshot,
    peers: PeerTable,
    /// Whether this client's own element is buffering
    buffering: bool,
}

impl ClientSynchronizer {
    pub fn new(participant_id: impl Into<String>, clock: LogicalClock) -> Self {
        Self {
            participant_id: participant_id.into(),
            clock,
            snapshot: PlaybackSnapshot::new(),
            peers: PeerTable::new(),
            buffering: false,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut LogicalClock {
        &mut self.clock
    }

    pub fn snapshot(&self) -> &PlaybackSnapshot {
        &self.snapshot
    }

    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    /// Local intents are only accepted once the clock has synced
    pub fn is_ready(&self) -> bool {
        self.clock.is_synced()
    }

    pub fn play(&mut self) -> Option<WireMessage> {
        self.mutate("play", |this, at| {
            this.snapshot.play(at);
        })
    }

    pub fn pause(&mut self) -> Option<WireMessage> {
        self.mutate("pause", |this, at| {
            this.snapshot.pause(at);
        })
    }

    pub fn seek(&mut self, video_time: f64) -> Option<WireMessage> {
        self.mutate("seek", |this, at| {
            this.snapshot.seek(video_time, at);
        })
    }

    pub fn set_media_index(&mut self, media_index: u32) -> Option<WireMessage> {
        self.mutate("set_media_index", |this, at| {
            this.snapshot.set_media_index(media_index, at);
        })
    }

    /// No message if already buffering
    pub fn start_buffering(&mut self) -> Option<WireMessage> {
        if self.buffering {
            return None;
        }
        self.mutate("start_buffering", |this, at| {
            this.snapshot.add_buffering(at);
            this.buffering = true;
        })
    }

    /// No message if not buffering
    pub fn stop_buffering(&mut self) -> Option<WireMessage> {
        if !self.buffering {
            return None;
        }
        self.mutate("stop_buffering", |this, at| {
            this.snapshot.sub_buffering(at);
            this.buffering = false;
        })
    }

    /// The stored snapshot as a `state` message
    pub fn state_message(&self) -> WireMessage {
        WireMessage::State(
            self.snapshot
                .to_message(&self.participant_id, self.buffering),
        )
    }

    /// Apply a message from the room; returns a reply to publish, if any
    pub fn handle_message(&mut self, message: &WireMessage) -> Option<WireMessage> {
        match message {
            WireMessage::RoomConnected(connected) => {
                let me = self.participant_id.clone();
                self.peers.reset_to(
                    connected
                        .participants
                        .iter()
                        .filter(|id| **id != me)
                        .cloned(),
                );
                self.reassert()
            }
            WireMessage::Join(event) => {
                if event.participant_id == self.participant_id {
                    return None;
                }
                self.peers.track(&event.participant_id);
                // The newcomer has no state of its own yet
                self.reassert()
            }
            WireMessage::Leave(event) => {
                if self.peers.untrack(&event.participant_id) == Some(PeerStatus::Buffering) {
                    // A departed peer can no longer retract its buffering
                    let at = self.clock.now();
                    self.snapshot.sub_buffering(at);
                    tracing::info!(
                        "Peer '{}' left while buffering; released its buffering",
                        event.participant_id
                    );
                }
                None
            }
            WireMessage::State(state) => {
                if state.participant_id == self.participant_id {
                    return None;
                }
                self.peers.update(&state.participant_id, state.buffering);
                let remote = PlaybackSnapshot::from(state);
                if self.snapshot.merge(&remote) {
                    tracing::debug!(
                        "Merged state from '{}' (update_time={:.3})",
                        state.participant_id,
                        remote.update_time
                    );
                } else {
                    tracing::debug!(
                        "Ignored stale state from '{}' ({:.3} <= {:.3})",
                        state.participant_id,
                        remote.update_time,
                        self.snapshot.update_time
                    );
                }
                None
            }
            WireMessage::Heartbeat => None,
        }
    }

    pub fn target_state(&self) -> TargetState {
        let waiting = !self.buffering && self.peers.any_buffering();
        let now = self.clock.now();
        TargetState {
            paused: waiting || self.snapshot.paused,
            waiting,
            video_time: self.snapshot.video_time_at(now),
            media_index: self.snapshot.media_index,
        }
    }

    fn mutate(&mut self, action: &str, apply: impl FnOnce(&mut Self, f64)) -> Option<WireMessage> {
        if !self.is_ready() {
            tracing::debug!("Ignoring {} before the first clock sync", action);
            return None;
        }
        let at = self.clock.now();
        apply(self, at);
        Some(self.state_message())
    }

    fn reassert(&self) -> Option<WireMessage> {
        self.snapshot
            .is_initialized()
            .then(|| self.state_message())
    }
}
