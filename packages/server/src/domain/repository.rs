//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Participant, ParticipantId, RepositoryError, Room, RoomId};

/// Room Repository trait
///
/// ルームのメンバーシップ表へのインターフェース。
/// ルームは最初の `join` で作成され、最後の `leave` で削除される。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 参加者をルームに追加（ルームが無ければ作成する）
    async fn join(&self, room_id: &RoomId, participant: Participant)
    -> Result<(), RepositoryError>;

    /// 参加者をルームから削除し、削除した参加者を返す
    ///
    /// ルームが空になった場合はルーム自体も削除する。
    /// 参加者がいなかった場合は `None`（冪等）。
    async fn leave(&self, room_id: &RoomId, participant_id: &ParticipantId) -> Option<Participant>;

    /// ルームの参加者 ID 一覧（ID 順、ルームが無ければ空）
    async fn member_ids(&self, room_id: &RoomId) -> Vec<ParticipantId>;

    /// Room エンティティを取得
    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError>;

    /// 全ルームを取得（ルーム ID 順）
    async fn list_rooms(&self) -> Vec<Room>;

    /// 存在するルーム数
    async fn count_rooms(&self) -> usize;
}
