//! Playback snapshot.
//!
//! The stored `video_time` is only valid as of `update_time`. The current
//! position is always derived: frozen while paused or buffering, otherwise
//! advanced by the time elapsed since `update_time`.
//!
//! Every mutator settles the snapshot at the mutation time before applying
//! its change, so the derived position right after a mutation is exactly the
//! value the mutation set.

use tandem_shared::protocol::StateMessage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSnapshot {
    pub paused: bool,
    pub video_time: f64,
    pub buffering_count: u32,
    pub media_index: u32,
    /// Logical timestamp of the last mutation; `0.0` until the first one
    pub update_time: f64,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            paused: true,
            video_time: 0.0,
            buffering_count: 0,
            media_index: 0,
            update_time: 0.0,
        }
    }
}

impl PlaybackSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any update, local or merged, has been applied
    pub fn is_initialized(&self) -> bool {
        self.update_time > 0.0
    }

    /// Whether the playhead moves with time
    pub fn is_advancing(&self) -> bool {
        !self.paused && self.buffering_count == 0
    }

    /// Position in seconds as of `at`
    pub fn video_time_at(&self, at: f64) -> f64 {
        if self.is_advancing() {
            self.video_time + (at - self.update_time).max(0.0)
        } else {
            self.video_time
        }
    }

    /// Projection of this snapshot at `at`
    pub fn state_at(&self, at: f64) -> PlaybackSnapshot {
        let mut projected = *self;
        projected.settle(at);
        projected
    }

    pub fn play(&mut self, at: f64) -> f64 {
        let at = self.settle(at);
        self.paused = false;
        at
    }

    pub fn pause(&mut self, at: f64) -> f64 {
        let at = self.settle(at);
        self.paused = true;
        at
    }

    pub fn seek(&mut self, video_time: f64, at: f64) -> f64 {
        let at = self.settle(at);
        self.video_time = video_time.max(0.0);
        at
    }

    pub fn add_buffering(&mut self, at: f64) -> f64 {
        let at = self.settle(at);
        self.buffering_count = self.buffering_count.saturating_add(1);
        at
    }

    pub fn sub_buffering(&mut self, at: f64) -> f64 {
        let at = self.settle(at);
        if self.buffering_count == 0 {
            tracing::warn!("sub_buffering called with no outstanding buffering");
        }
        self.buffering_count = self.buffering_count.saturating_sub(1);
        at
    }

    pub fn set_media_index(&mut self, media_index: u32, at: f64) -> f64 {
        let at = self.settle(at);
        self.video_time = 0.0;
        self.media_index = media_index;
        at
    }

    /// Last-writer-wins merge; returns whether `remote` replaced this snapshot
    pub fn merge(&mut self, remote: &PlaybackSnapshot) -> bool {
        if remote.update_time > self.update_time {
            *self = *remote;
            true
        } else {
            false
        }
    }

    pub fn to_message(&self, participant_id: &str, buffering: bool) -> StateMessage {
        StateMessage {
            paused: self.paused,
            video_time: self.video_time,
            buffering_count: self.buffering_count,
            media_index: self.media_index,
            update_time: self.update_time,
            participant_id: participant_id.to_string(),
            buffering,
        }
    }

    /// Project `video_time` to `at` and move `update_time` there.
    ///
    /// `update_time` never moves backwards; an earlier `at` settles at the
    /// stored `update_time` instead.
    fn settle(&mut self, at: f64) -> f64 {
        let at = at.max(self.update_time);
        self.video_time = self.video_time_at(at);
        self.update_time = at;
        at
    }
}

impl From<&StateMessage> for PlaybackSnapshot {
    fn from(message: &StateMessage) -> Self {
        Self {
            paused: message.paused,
            video_time: message.video_time,
            buffering_count: message.buffering_count,
            media_index: message.media_index,
            update_time: message.update_time,
        }
    }
}
