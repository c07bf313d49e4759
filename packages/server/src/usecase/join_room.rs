//! UseCase: ルームへの参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute(): 重複チェックとメンバーシップ表への登録
//! - JoinRoomUseCase::announce(): 新規参加者への room-connected 送信と既存参加者への join 配信
//!
//! ### なぜこのテストが必要か
//! - 同じ参加者 ID の二重接続を防ぐ
//! - 既存参加者が新規参加者を知ることで、自分の再生状態を再送できる
//!
//! ### どのような状況を想定しているか
//! - 正常系：空のルームへの参加、既存参加者がいるルームへの参加
//! - 異常系：重複した参加者 ID での参加

use std::sync::Arc;

use tandem_shared::{
    protocol::{RoomConnectedMessage, WireMessage},
    time::get_timestamp_millis,
};

use crate::domain::{
    MessagePusher, Participant, ParticipantId, PusherChannel, RoomId, RoomRepository, Timestamp,
};

use super::{
    error::JoinError,
    fan_out::{FanOut, FanOutReport},
};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 既存参加者への配信
    fan_out: FanOut,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            fan_out: FanOut::new(repository.clone(), message_pusher.clone()),
            repository,
            message_pusher,
        }
    }

    /// 参加者をルームに登録し、送信チャンネルを紐付ける
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 参加成功（参加時刻）
    /// * `Err(JoinError::DuplicateParticipantId)` - 同じ ID の参加者が既にいる
    pub async fn execute(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        sender: PusherChannel,
    ) -> Result<Timestamp, JoinError> {
        let joined_at = Timestamp::new(get_timestamp_millis());

        // 1. メンバーシップ表に追加（重複チェックを含む）
        self.repository
            .join(room_id, Participant::new(participant_id.clone(), joined_at))
            .await?;

        // 2. MessagePusher に送信チャンネルを登録
        self.message_pusher
            .register_client(room_id, participant_id, sender)
            .await;

        Ok(joined_at)
    }

    /// 新規参加者に room-connected を送り、既存参加者に join を配信する
    ///
    /// 送信チャンネルは `execute` の時点で登録済みのため、他の参加者の state が
    /// room-connected より先に積まれることがある（クライアントは room-connected で
    /// 参加者表を作り直し、既知の状態は引き継ぐ）。
    pub async fn announce(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Result<FanOutReport, JoinError> {
        let participants = self
            .repository
            .member_ids(room_id)
            .await
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();

        let connected = WireMessage::RoomConnected(RoomConnectedMessage {
            participant_id: participant_id.as_str().to_string(),
            participants,
        });
        self.push_encoded(room_id, participant_id, &connected)
            .await?;

        let joined = WireMessage::join(participant_id.as_str());
        let report = match joined.to_json() {
            Ok(json) => {
                self.fan_out
                    .deliver(room_id, Some(participant_id), &json)
                    .await
            }
            Err(e) => {
                tracing::error!("Failed to encode join message: {}", e);
                FanOutReport::default()
            }
        };
        Ok(report)
    }

    async fn push_encoded(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        message: &WireMessage,
    ) -> Result<(), JoinError> {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode {} message: {}", message.kind(), e);
                return Ok(());
            }
        };
        self.message_pusher
            .push_to(room_id, participant_id, &json)
            .await
            .map_err(JoinError::NotifyFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BroadcastReport, MockMessagePusher},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
    };
    use tokio::sync::mpsc;

    fn room_id() -> RoomId {
        RoomId::new("lobby".to_string()).unwrap()
    }

    fn participant_id(value: &str) -> ParticipantId {
        ParticipantId::new(value.to_string()).unwrap()
    }

    fn create_test_usecase() -> (JoinRoomUseCase, Arc<InMemoryRoomRepository>) {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        (JoinRoomUseCase::new(repository.clone(), pusher), repository)
    }

    #[tokio::test]
    async fn test_join_registers_participant() {
        // テスト項目: 参加者がメンバーシップ表に登録される
        // given (前提条件):
        let (usecase, repository) = create_test_usecase();
        let (tx, _rx) = mpsc::unbounded_channel();

        // when (操作):
        let result = usecase
            .execute(&room_id(), &participant_id("alice"), tx)
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(
            repository.member_ids(&room_id()).await,
            vec![participant_id("alice")]
        );
    }

    #[tokio::test]
    async fn test_join_rejects_duplicate_participant() {
        // テスト項目: 同じ参加者 ID での二重参加は DuplicateParticipantId エラーになる
        // given (前提条件):
        let (usecase, repository) = create_test_usecase();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        usecase
            .execute(&room_id(), &participant_id("alice"), tx1)
            .await
            .unwrap();

        // when (操作):
        let result = usecase
            .execute(&room_id(), &participant_id("alice"), tx2)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(JoinError::DuplicateParticipantId("alice".to_string()))
        );
        assert_eq!(repository.member_ids(&room_id()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_announce_sends_room_connected_and_join() {
        // テスト項目: 新規参加者には room-connected、既存参加者には join が届く
        // given (前提条件):
        let (usecase, _repository) = create_test_usecase();
        let (tx_alice, mut rx_alice) = mpsc::unbounded_channel();
        let (tx_bob, mut rx_bob) = mpsc::unbounded_channel();
        usecase
            .execute(&room_id(), &participant_id("alice"), tx_alice)
            .await
            .unwrap();
        usecase
            .announce(&room_id(), &participant_id("alice"))
            .await
            .unwrap();
        usecase
            .execute(&room_id(), &participant_id("bob"), tx_bob)
            .await
            .unwrap();

        // when (操作):
        let report = usecase
            .announce(&room_id(), &participant_id("bob"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, vec![participant_id("alice")]);

        let bob_first = WireMessage::parse(&rx_bob.recv().await.unwrap()).unwrap();
        assert_eq!(
            bob_first,
            WireMessage::RoomConnected(RoomConnectedMessage {
                participant_id: "bob".to_string(),
                participants: vec!["alice".to_string(), "bob".to_string()],
            })
        );

        // alice は自分の room-connected の後に bob の join を受け取る
        let alice_first = WireMessage::parse(&rx_alice.recv().await.unwrap()).unwrap();
        assert!(matches!(alice_first, WireMessage::RoomConnected(_)));
        let alice_second = WireMessage::parse(&rx_alice.recv().await.unwrap()).unwrap();
        assert_eq!(alice_second, WireMessage::join("bob"));
    }

    #[tokio::test]
    async fn test_announce_broadcasts_join_to_existing_members_only() {
        // テスト項目: join の配信対象に新規参加者自身は含まれない（MessagePusher のモックで検証）
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        for id in ["alice", "bob"] {
            repository
                .join(
                    &room_id(),
                    Participant::new(participant_id(id), Timestamp::new(0)),
                )
                .await
                .unwrap();
        }
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf(|_, participant, content| {
                participant.as_str() == "bob" && content.contains("room-connected")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        pusher
            .expect_broadcast()
            .withf(|_, targets, content| {
                targets == &vec![ParticipantId::new("alice".to_string()).unwrap()]
                    && content.contains("\"join\"")
            })
            .times(1)
            .returning(|_, targets, _| BroadcastReport {
                delivered: targets,
                failed: vec![],
            });
        let usecase = JoinRoomUseCase::new(repository, Arc::new(pusher));

        // when (操作):
        let report = usecase.announce(&room_id(), &participant_id("bob")).await;

        // then (期待する結果):
        assert_eq!(report.unwrap().delivered, vec![participant_id("alice")]);
    }

    #[tokio::test]
    async fn test_message_queued_before_announce_precedes_room_connected() {
        // テスト項目: execute と announce の間に配信されたメッセージは room-connected より先に届く
        // given (前提条件):
        let (usecase, _repository) = create_test_usecase();
        let pusher = usecase.message_pusher.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        usecase
            .execute(&room_id(), &participant_id("bob"), tx)
            .await
            .unwrap();
        pusher
            .push_to(&room_id(), &participant_id("bob"), "early-state")
            .await
            .unwrap();

        // when (操作):
        usecase
            .announce(&room_id(), &participant_id("bob"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(rx.recv().await, Some("early-state".to_string()));
        let second = WireMessage::parse(&rx.recv().await.unwrap()).unwrap();
        assert!(matches!(second, WireMessage::RoomConnected(_)));
    }
}
