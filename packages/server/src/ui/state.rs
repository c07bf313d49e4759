//! Shared application state handed to every handler.

use std::{sync::Arc, time::Duration};

use crate::usecase::{
    GetMediaListUseCase, GetReferenceTimeUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
    JoinRoomUseCase, LeaveRoomUseCase, RelayMessageUseCase,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// RelayMessageUseCase（メッセージ中継のユースケース）
    pub relay_message_usecase: Arc<RelayMessageUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
    /// GetMediaListUseCase（メディアリスト取得のユースケース）
    pub get_media_list_usecase: Arc<GetMediaListUseCase>,
    /// GetReferenceTimeUseCase（基準時刻取得のユースケース）
    pub get_reference_time_usecase: Arc<GetReferenceTimeUseCase>,
    /// 受信がこの時間途絶えた接続は切断したものとして退出させる
    pub idle_timeout: Duration,
}
