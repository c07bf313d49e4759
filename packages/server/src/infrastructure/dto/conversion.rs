//! Conversion from domain entities to HTTP DTOs.

use tandem_shared::time::timestamp_to_rfc3339;

use crate::domain::{MediaItem, Participant, Room};

use super::http::{MediaItemDto, ParticipantDetailDto, RoomDetailDto, RoomSummaryDto};

impl From<MediaItem> for MediaItemDto {
    fn from(model: MediaItem) -> Self {
        Self {
            name: model.name,
            source: model.source,
            index: model.index,
        }
    }
}

impl From<&Participant> for ParticipantDetailDto {
    fn from(model: &Participant) -> Self {
        Self {
            participant_id: model.id.as_str().to_string(),
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
        }
    }
}

impl From<Room> for RoomSummaryDto {
    fn from(model: Room) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            participants: model
                .participant_ids()
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}

impl From<Room> for RoomDetailDto {
    fn from(model: Room) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            participants: model.participants.iter().map(Into::into).collect(),
            created_at: timestamp_to_rfc3339(model.created_at.value()),
        }
    }
}
