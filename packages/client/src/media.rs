//! Media list lookup.

use serde::Deserialize;

use crate::error::ClientError;

/// One playable entry of the room's media list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaItem {
    pub name: String,
    #[serde(alias = "video")]
    pub source: String,
    pub index: u32,
}

/// `GET /api/v1/rooms/{room_id}/media`
pub async fn fetch_media_list(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<MediaItem>, ClientError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| ClientError::MediaList(e.to_string()))?;
    let items: Vec<MediaItem> = response
        .json()
        .await
        .map_err(|e| ClientError::MediaList(e.to_string()))?;
    tracing::info!("Loaded {} media item(s) from {}", items.len(), url);
    Ok(items)
}

/// Find the entry for `index`
pub fn lookup(items: &[MediaItem], index: u32) -> Option<&MediaItem> {
    items.iter().find(|item| item.index == index)
}
