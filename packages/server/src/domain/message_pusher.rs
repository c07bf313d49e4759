//! MessagePusher trait 定義
//!
//! 接続中の参加者へメッセージを届けるためのインターフェース。
//! 参加者は (RoomId, ParticipantId) の組で識別される。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{MessagePushError, ParticipantId, RoomId};

/// 参加者 1 接続分の送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// ブロードキャスト結果
///
/// `failed` に含まれる参加者は送信チャンネルが閉じている（切断済み）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<ParticipantId>,
    pub failed: Vec<ParticipantId>,
}

/// MessagePusher trait
///
/// UseCase 層はこの trait に依存し、WebSocket などの具体的な通信手段には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 参加者の送信チャンネルを登録
    async fn register_client(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        sender: PusherChannel,
    );

    /// 参加者の送信チャンネルを登録解除
    async fn unregister_client(&self, room_id: &RoomId, participant_id: &ParticipantId);

    /// 特定の参加者にメッセージを送信
    async fn push_to(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// 複数の参加者にメッセージを送信
    ///
    /// 一部の送信失敗は許容し、失敗した参加者を `BroadcastReport::failed` で返す。
    async fn broadcast(
        &self,
        room_id: &RoomId,
        targets: Vec<ParticipantId>,
        content: &str,
    ) -> BroadcastReport;
}
