//! UseCase: メディアリストの取得

use std::sync::Arc;

use crate::domain::{MediaCatalog, MediaItem, RoomId};

/// メディアリスト取得のユースケース
pub struct GetMediaListUseCase {
    /// MediaCatalog（メディアリストの提供元）
    catalog: Arc<dyn MediaCatalog>,
}

impl GetMediaListUseCase {
    pub fn new(catalog: Arc<dyn MediaCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn execute(&self, room_id: &RoomId) -> Vec<MediaItem> {
        self.catalog.media_list(room_id).await
    }
}
