//! エンティティ（Entity）
//!
//! - `Room`: ルームとその参加者
//! - `Participant`: ルームへの 1 接続
//! - `MediaItem`: ルームで再生できるメディア
//!
//! リレーサーバーは再生状態を一切保持しません。
//! Room が持つのはメンバーシップのみです。

use serde::Deserialize;

use super::{ParticipantId, RoomError, RoomId, Timestamp};

/// ルーム参加者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: ParticipantId,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(id: ParticipantId, joined_at: Timestamp) -> Self {
        Self { id, joined_at }
    }
}

/// ルーム
///
/// 最初の参加者が join した時点で作成され、最後の参加者が leave した時点で削除される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub participants: Vec<Participant>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            participants: Vec::new(),
            created_at,
        }
    }

    /// 参加者を追加（同じ ID の参加者が既にいる場合はエラー）
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RoomError> {
        if self.contains(&participant.id) {
            return Err(RoomError::DuplicateParticipant(
                participant.id.as_str().to_string(),
            ));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// 参加者を削除し、削除した参加者を返す
    pub fn remove_participant(&mut self, participant_id: &ParticipantId) -> Option<Participant> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.id == participant_id)?;
        Some(self.participants.remove(index))
    }

    pub fn contains(&self, participant_id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == participant_id)
    }

    /// 参加者 ID の一覧（ID 順）
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.participants.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

/// ルームで再生できるメディア
///
/// メディアリストファイルでは `source` の代わりに `video` キーも受け付ける。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaItem {
    pub name: String,
    #[serde(alias = "video")]
    pub source: String,
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: &str) -> Participant {
        Participant::new(ParticipantId::new(id.to_string()).unwrap(), Timestamp::new(1))
    }

    fn create_test_room() -> Room {
        Room::new(RoomId::new("lobby".to_string()).unwrap(), Timestamp::new(0))
    }

    #[test]
    fn test_add_participant_rejects_duplicate() {
        // テスト項目: 同じ ID の参加者を二重に追加するとエラーになる
        // given (前提条件):
        let mut room = create_test_room();
        room.add_participant(participant("alice")).unwrap();

        // when (操作):
        let result = room.add_participant(participant("alice"));

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomError::DuplicateParticipant("alice".to_string()))
        );
        assert_eq!(room.participants.len(), 1);
    }

    #[test]
    fn test_remove_participant_returns_removed() {
        // テスト項目: 参加者を削除すると削除された参加者が返り、ルームが空になる
        // given (前提条件):
        let mut room = create_test_room();
        room.add_participant(participant("alice")).unwrap();

        // when (操作):
        let removed = room.remove_participant(&ParticipantId::new("alice".to_string()).unwrap());

        // then (期待する結果):
        assert_eq!(removed.map(|p| p.id.as_str().to_string()), Some("alice".to_string()));
        assert!(room.is_empty());
    }

    #[test]
    fn test_remove_unknown_participant() {
        // テスト項目: 存在しない参加者の削除は None を返す
        // given (前提条件):
        let mut room = create_test_room();

        // when (操作):
        let removed = room.remove_participant(&ParticipantId::new("ghost".to_string()).unwrap());

        // then (期待する結果):
        assert!(removed.is_none());
    }

    #[test]
    fn test_participant_ids_are_sorted() {
        // テスト項目: participant_ids は ID 順に並ぶ
        // given (前提条件):
        let mut room = create_test_room();
        room.add_participant(participant("carol")).unwrap();
        room.add_participant(participant("alice")).unwrap();
        room.add_participant(participant("bob")).unwrap();

        // when (操作):
        let ids = room.participant_ids();

        // then (期待する結果):
        let ids: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_media_item_accepts_video_alias() {
        // テスト項目: メディア項目は video キーを source として読み込める
        // given (前提条件):
        let json = r#"{"name":"Intro","video":"https://cdn.example.com/intro.m3u8","index":0}"#;

        // when (操作):
        let item: MediaItem = serde_json::from_str(json).unwrap();

        // then (期待する結果):
        assert_eq!(item.source, "https://cdn.example.com/intro.m3u8");
        assert_eq!(item.index, 0);
    }
}
