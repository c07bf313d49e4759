//! UseCase: メッセージの中継
//!
//! リレーは再生状態を解釈しません。送信者以外のルーム参加者に、受け取ったメッセージを
//! そのまま配信するだけです。heartbeat だけは送信者本人に返します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayMessageUseCase::execute(): 送信者を除いた配信
//! - RelayMessageUseCase::echo(): 送信者本人への返信
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数参加者のルームでの中継、送信者のみのルーム
//! - 異常系：ルームに参加していない送信者からのメッセージ

use std::sync::Arc;

use crate::domain::{MessagePusher, ParticipantId, RoomId, RoomRepository};

use super::{
    error::RelayError,
    fan_out::{FanOut, FanOutReport},
};

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 他の参加者への配信
    fan_out: FanOut,
}

impl RelayMessageUseCase {
    /// 新しい RelayMessageUseCase を作成
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

    /// 送信者以外のルーム参加者全員に `payload` を配信する
    pub async fn execute(
        &self,
        room_id: &RoomId,
        from: &ParticipantId,
        payload: &str,
    ) -> Result<FanOutReport, RelayError> {
        let members = self.repository.member_ids(room_id).await;
        if !members.contains(from) {
            return Err(RelayError::NotInRoom(from.as_str().to_string()));
        }

        let report = self.fan_out.deliver(room_id, Some(from), payload).await;
        tracing::debug!(
            "Relayed message from '{}' to {} participant(s) in room '{}'",
            from,
            report.delivered.len(),
            room_id
        );
        Ok(report)
    }

    /// 送信者本人に `payload` を返す（heartbeat の応答）
    pub async fn echo(
        &self,
        room_id: &RoomId,
        to: &ParticipantId,
        payload: &str,
    ) -> Result<(), RelayError> {
        self.message_pusher
            .push_to(room_id, to, payload)
            .await
            .map_err(RelayError::PushFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BroadcastReport, MessagePushError, MockMessagePusher, Participant, Timestamp},
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

    async fn create_test_repository(ids: &[&str]) -> Arc<InMemoryRoomRepository> {
        let repository = Arc::new(InMemoryRoomRepository::new());
        for id in ids {
            repository
                .join(
                    &room_id(),
                    Participant::new(participant_id(id), Timestamp::new(0)),
                )
                .await
                .unwrap();
        }
        repository
    }

    #[tokio::test]
    async fn test_relay_excludes_sender() {
        // テスト項目: 送信者を除いたルーム参加者全員が配信対象になる
        // given (前提条件):
        let repository = create_test_repository(&["alice", "bob", "carol"]).await;
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(|_, targets, content| {
                let ids: Vec<&str> = targets.iter().map(|id| id.as_str()).collect();
                ids == vec!["bob", "carol"] && content == "state"
            })
            .times(1)
            .returning(|_, targets, _| BroadcastReport {
                delivered: targets,
                failed: vec![],
            });
        let usecase = RelayMessageUseCase::new(repository, Arc::new(pusher));

        // when (操作):
        let result = usecase
            .execute(&room_id(), &participant_id("alice"), "state")
            .await;

        // then (期待する結果):
        let report = result.unwrap();
        assert_eq!(
            report.delivered,
            vec![participant_id("bob"), participant_id("carol")]
        );
        assert!(report.evicted.is_empty());
    }

    #[tokio::test]
    async fn test_relay_in_room_with_only_sender() {
        // テスト項目: 送信者のみのルームでは配信対象が空になる
        // given (前提条件):
        let repository = create_test_repository(&["alice"]).await;
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let usecase = RelayMessageUseCase::new(repository, pusher);

        // when (操作):
        let result = usecase
            .execute(&room_id(), &participant_id("alice"), "state")
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok(FanOutReport::default()));
    }

    #[tokio::test]
    async fn test_relay_from_non_member_is_rejected() {
        // テスト項目: ルームに参加していない送信者のメッセージは NotInRoom になる
        // given (前提条件):
        let repository = create_test_repository(&["alice"]).await;
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = RelayMessageUseCase::new(repository, Arc::new(pusher));

        // when (操作):
        let result = usecase
            .execute(&room_id(), &participant_id("mallory"), "state")
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NotInRoom("mallory".to_string())));
    }

    #[tokio::test]
    async fn test_echo_reaches_only_sender() {
        // テスト項目: echo は送信者本人にのみ届く
        // given (前提条件):
        let repository = create_test_repository(&["alice", "bob"]).await;
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let (tx_alice, mut rx_alice) = mpsc::unbounded_channel();
        let (tx_bob, mut rx_bob) = mpsc::unbounded_channel();
        pusher
            .register_client(&room_id(), &participant_id("alice"), tx_alice)
            .await;
        pusher
            .register_client(&room_id(), &participant_id("bob"), tx_bob)
            .await;
        let usecase = RelayMessageUseCase::new(repository, pusher);

        // when (操作):
        let result = usecase
            .echo(&room_id(), &participant_id("alice"), r#"{"type":"heartbeat"}"#)
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(
            rx_alice.recv().await,
            Some(r#"{"type":"heartbeat"}"#.to_string())
        );
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_echo_to_unregistered_participant_fails() {
        // テスト項目: 登録されていない参加者への echo は PushFailed になる
        // given (前提条件):
        let repository = create_test_repository(&[]).await;
        let usecase = RelayMessageUseCase::new(repository, Arc::new(WebSocketMessagePusher::new()));

        // when (操作):
        let result = usecase
            .echo(&room_id(), &participant_id("ghost"), "{}")
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::PushFailed(MessagePushError::ClientNotFound(
                "ghost".to_string()
            )))
        );
    }
}
