//! ルーム内ファンアウト（複数の UseCase から共有される配信処理）
//!
//! 送信に失敗した参加者（送信チャンネルが閉じている = 切断済み）はルームから退出させ、
//! 残りの参加者にその参加者の `leave` を配信します。
//! `leave` の配信でさらに失敗した参加者がいれば同じ処理を繰り返します。
//! 退出のたびにメンバーが 1 人減るため、処理は必ず終了します。

use std::{collections::VecDeque, sync::Arc};

use tandem_shared::protocol::WireMessage;

use crate::domain::{MessagePusher, ParticipantId, RoomId, RoomRepository};

/// 配信結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// 元のメッセージが届いた参加者
    pub delivered: Vec<ParticipantId>,
    /// 送信失敗により退出させた参加者
    pub evicted: Vec<ParticipantId>,
}

/// ルーム内の参加者への配信
pub struct FanOut {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl FanOut {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// `exclude` 以外のルーム参加者全員に `payload` を配信する
    pub async fn deliver(
        &self,
        room_id: &RoomId,
        exclude: Option<&ParticipantId>,
        payload: &str,
    ) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut pending: VecDeque<(Option<ParticipantId>, String)> = VecDeque::new();
        pending.push_back((exclude.cloned(), payload.to_string()));
        let mut is_original = true;

        while let Some((exclude, payload)) = pending.pop_front() {
            let targets: Vec<ParticipantId> = self
                .repository
                .member_ids(room_id)
                .await
                .into_iter()
                .filter(|id| Some(id) != exclude.as_ref())
                .collect();

            let result = self
                .message_pusher
                .broadcast(room_id, targets, &payload)
                .await;
            if is_original {
                report.delivered = result.delivered;
                is_original = false;
            }

            for failed in result.failed {
                if !self.evict(room_id, &failed).await {
                    continue;
                }
                match WireMessage::leave(failed.as_str()).to_json() {
                    Ok(leave) => pending.push_back((None, leave)),
                    Err(e) => tracing::error!("Failed to encode leave message: {}", e),
                }
                report.evicted.push(failed);
            }
        }

        report
    }

    /// 参加者を退出させる。実際に退出させた場合のみ true
    async fn evict(&self, room_id: &RoomId, participant_id: &ParticipantId) -> bool {
        self.message_pusher
            .unregister_client(room_id, participant_id)
            .await;
        let removed = self.repository.leave(room_id, participant_id).await;
        if removed.is_some() {
            tracing::warn!(
                "Evicted unreachable participant '{}' from room '{}'",
                participant_id,
                room_id
            );
        }
        removed.is_some()
    }
}
