//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError};

/// 参加（join）時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Participant '{0}' is already in the room")]
    DuplicateParticipantId(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    #[error("Failed to notify participant: {0}")]
    NotifyFailed(MessagePushError),
}

impl From<RepositoryError> for JoinError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateParticipant(id) => JoinError::DuplicateParticipantId(id),
            other => JoinError::Repository(other),
        }
    }
}

/// 退出（leave）時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveError {
    /// 既に退出済み（送信失敗による強制退出を含む）
    #[error("Participant '{0}' is not in the room")]
    NotInRoom(String),
}

/// メッセージ中継時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Participant '{0}' is not in the room")]
    NotInRoom(String),

    #[error("Failed to push message: {0}")]
    PushFailed(MessagePushError),
}

/// ルーム詳細取得時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("Invalid room id")]
    InvalidRoomId,

    #[error("Room not found")]
    RoomNotFound,
}
