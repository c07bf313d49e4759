//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Identifier must not be empty")]
    Empty,

    #[error("Identifier is too long (max {max}, got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Identifier contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// Room エンティティ操作時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Participant '{0}' is already in the room")]
    DuplicateParticipant(String),
}

/// Repository 操作時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Participant '{0}' is already in the room")]
    DuplicateParticipant(String),
}

impl From<RoomError> for RepositoryError {
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::DuplicateParticipant(id) => RepositoryError::DuplicateParticipant(id),
        }
    }
}

/// MessagePusher 操作時のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Participant '{0}' is not registered")]
    ClientNotFound(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// メディアリスト読み込み時のエラー
#[derive(Debug, Error)]
pub enum MediaCatalogError {
    #[error("Failed to read media list '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid media list '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
