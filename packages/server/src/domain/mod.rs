//! ドメイン層
//!
//! リレーサーバーのドメインモデルと、外部に依存する処理のインターフェース（trait）を定義します。

mod entity;
mod error;
mod media;
mod message_pusher;
mod repository;
mod value_object;

pub use entity::{MediaItem, Participant, Room};
pub use error::{MediaCatalogError, MessagePushError, RepositoryError, RoomError, ValueObjectError};
pub use media::MediaCatalog;
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
pub use message_pusher::{BroadcastReport, MessagePusher, PusherChannel};
pub use repository::RoomRepository;
pub use value_object::{MAX_ID_LENGTH, ParticipantId, ParticipantIdFactory, RoomId, Timestamp};
