//! MediaCatalog trait 定義

use async_trait::async_trait;

use super::{MediaItem, RoomId};

/// ルームごとのメディアリストを提供する
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// ルームのメディアリスト（index 順）
    async fn media_list(&self, room_id: &RoomId) -> Vec<MediaItem>;
}
