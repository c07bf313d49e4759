//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{
        ClockDto, HealthDto, MediaItemDto, RoomDetailDto, RoomSummaryDto,
    },
    ui::state::AppState,
    usecase::GetRoomDetailError,
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
    })
}

/// Reference time used by clients to estimate their clock offset
pub async fn get_reference_time(State(state): State<Arc<AppState>>) -> Json<ClockDto> {
    Json(ClockDto {
        timestamp: state.get_reference_time_usecase.execute(),
    })
}

/// Media list of a room
pub async fn get_media_list(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MediaItemDto>>, StatusCode> {
    let room_id = RoomId::try_from(room_id).map_err(|e| {
        tracing::warn!("Invalid room_id in media list request: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let items = state.get_media_list_usecase.execute(&room_id).await;

    // Domain Model から DTO への変換
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute().await;
    Json(rooms.into_iter().map(Into::into).collect())
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(room_id).await {
        Ok(room) => Ok(Json(room.into())),
        Err(GetRoomDetailError::InvalidRoomId) => Err(StatusCode::BAD_REQUEST),
        Err(GetRoomDetailError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
    }
}
