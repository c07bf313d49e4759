//! UseCase: ルームからの退出
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute(): メンバーシップ表からの削除と leave の配信
//!
//! ### どのような状況を想定しているか
//! - 正常系：残りの参加者がいる場合、最後の参加者の場合（ルーム削除）
//! - 異常系：既に強制退出させられていた参加者の切断（leave を二重に配信しない）

use std::sync::Arc;

use tandem_shared::protocol::WireMessage;

use crate::domain::{MessagePusher, ParticipantId, RoomId, RoomRepository};

use super::{
    error::LeaveError,
    fan_out::{FanOut, FanOutReport},
};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// 残りの参加者への配信
    fan_out: FanOut,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
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

    /// 退出を実行し、残りの参加者に leave を配信する
    ///
    /// # Returns
    ///
    /// * `Ok(FanOutReport)` - leave を受け取った参加者
    /// * `Err(LeaveError::NotInRoom)` - 既に退出済み
    pub async fn execute(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
    ) -> Result<FanOutReport, LeaveError> {
        // 1. MessagePusher から登録解除
        self.message_pusher
            .unregister_client(room_id, participant_id)
            .await;

        // 2. メンバーシップ表から削除（空になったルームは削除される）
        if self
            .repository
            .leave(room_id, participant_id)
            .await
            .is_none()
        {
            return Err(LeaveError::NotInRoom(participant_id.as_str().to_string()));
        }

        // 3. 残りの参加者に leave を配信
        let report = match WireMessage::leave(participant_id.as_str()).to_json() {
            Ok(json) => self.fan_out.deliver(room_id, None, &json).await,
            Err(e) => {
                tracing::error!("Failed to encode leave message: {}", e);
                FanOutReport::default()
            }
        };
        Ok(report)
    }
}
