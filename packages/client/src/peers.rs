//! Readiness of the other participants in the room.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    /// Joined but has not reported yet; does not block playback
    Unknown,
    Ready,
    Buffering,
}

#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<String, PeerStatus>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a peer; returns `false` if it was already tracked
    pub fn track(&mut self, participant_id: &str) -> bool {
        if self.peers.contains_key(participant_id) {
            return false;
        }
        self.peers
            .insert(participant_id.to_string(), PeerStatus::Unknown);
        true
    }

    pub fn untrack(&mut self, participant_id: &str) -> Option<PeerStatus> {
        self.peers.remove(participant_id)
    }

    /// Record a reported buffering flag, tracking the peer if needed.
    ///
    /// Returns the previous status, `None` for a peer seen for the first time.
    pub fn update(&mut self, participant_id: &str, buffering: bool) -> Option<PeerStatus> {
        let status = if buffering {
            PeerStatus::Buffering
        } else {
            PeerStatus::Ready
        };
        self.peers.insert(participant_id.to_string(), status)
    }

    pub fn status(&self, participant_id: &str) -> Option<PeerStatus> {
        self.peers.get(participant_id).copied()
    }

    pub fn any_buffering(&self) -> bool {
        self.peers
            .values()
            .any(|status| *status == PeerStatus::Buffering)
    }

    /// Replace the tracked set with `members`, keeping known statuses
    pub fn reset_to<I, S>(&mut self, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: HashSet<String> = members.into_iter().map(Into::into).collect();
        self.peers.retain(|id, _| members.contains(id));
        for id in members {
            self.peers.entry(id).or_insert(PeerStatus::Unknown);
        }
    }

    /// Peers and their statuses, sorted by id
    pub fn entries(&self) -> Vec<(String, PeerStatus)> {
        let mut entries: Vec<_> = self
            .peers
            .iter()
            .map(|(id, status)| (id.clone(), *status))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_peer_does_not_block() {
        // テスト項目: 参加直後の peer は Unknown で、再生を止めない
        // given (前提条件):
        let mut peers = PeerTable::new();

        // when (操作):
        let tracked = peers.track("bob");

        // then (期待する結果):
        assert!(tracked);
        assert_eq!(peers.status("bob"), Some(PeerStatus::Unknown));
        assert!(!peers.any_buffering());
    }

    #[test]
    fn test_track_keeps_known_status() {
        // テスト項目: 既に追跡中の peer を再度 track しても状態は変わらない
        // given (前提条件):
        let mut peers = PeerTable::new();
        peers.update("bob", true);

        // when (操作):
        let tracked = peers.track("bob");

        // then (期待する結果):
        assert!(!tracked);
        assert_eq!(peers.status("bob"), Some(PeerStatus::Buffering));
    }

    #[test]
    fn test_update_tracks_unknown_peer() {
        // テスト項目: join より先に state が届いた peer も追跡される
        // given (前提条件):
        let mut peers = PeerTable::new();

        // when (操作):
        let previous = peers.update("carol", true);

        // then (期待する結果):
        assert_eq!(previous, None);
        assert!(peers.any_buffering());
    }

    #[test]
    fn test_untrack_clears_buffering() {
        // テスト項目: バッファリング中の peer が退出すると待機が解除される
        // given (前提条件):
        let mut peers = PeerTable::new();
        peers.update("carol", true);
        peers.update("bob", false);

        // when (操作):
        let removed = peers.untrack("carol");

        // then (期待する結果):
        assert_eq!(removed, Some(PeerStatus::Buffering));
        assert!(!peers.any_buffering());
        assert_eq!(peers.len(), 1);
    }

    #[test]
    fn test_reset_to_members() {
        // テスト項目: 参加者一覧でリセットすると、いない peer は外れ、既知の状態は残る
        // given (前提条件):
        let mut peers = PeerTable::new();
        peers.update("bob", true);
        peers.update("gone", false);

        // when (操作):
        peers.reset_to(["bob", "dave"]);

        // then (期待する結果):
        assert_eq!(
            peers.entries(),
            vec![
                ("bob".to_string(), PeerStatus::Buffering),
                ("dave".to_string(), PeerStatus::Unknown),
            ]
        );
    }
}
