//! 全ルーム共通のメディアリストを JSON ファイルから読み込む MediaCatalog 実装
//!
//! ファイル形式:
//!
//! ```json
//! [
//!   {"name": "Intro", "source": "https://cdn.example.com/intro.m3u8", "index": 0},
//!   {"name": "Part 2", "video": "https://cdn.example.com/part2.m3u8", "index": 1}
//! ]
//! ```

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{MediaCatalog, MediaCatalogError, MediaItem, RoomId};

/// 起動時に読み込んだメディアリストを全ルームに提供する
#[derive(Debug, Clone, Default)]
pub struct StaticMediaCatalog {
    items: Vec<MediaItem>,
}

impl StaticMediaCatalog {
    /// メディアリストから作成（index 順に並べ替える）
    pub fn new(mut items: Vec<MediaItem>) -> Self {
        items.sort_by_key(|item| item.index);
        Self { items }
    }

    /// 空のメディアリスト
    pub fn empty() -> Self {
        Self::default()
    }

    /// JSON 文字列から読み込む
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self, MediaCatalogError> {
        let items: Vec<MediaItem> =
            serde_json::from_str(json).map_err(|source| MediaCatalogError::Parse {
                path: origin.to_string(),
                source,
            })?;
        Ok(Self::new(items))
    }

    /// JSON ファイルから読み込む
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MediaCatalogError> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| MediaCatalogError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::from_json_str(&json, &origin)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl MediaCatalog for StaticMediaCatalog {
    async fn media_list(&self, _room_id: &RoomId) -> Vec<MediaItem> {
        self.items.clone()
    }
}
