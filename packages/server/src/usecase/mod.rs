//! UseCase 層
//!
//! UI 層（ハンドラ）から呼ばれるアプリケーションの処理をまとめます。
//! ドメイン層の trait にのみ依存し、具体的な実装は起動時に注入されます。

mod error;
mod fan_out;
mod get_media_list;
mod get_reference_time;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod leave_room;
mod relay_message;

pub use error::{GetRoomDetailError, JoinError, LeaveError, RelayError};
pub use fan_out::{FanOut, FanOutReport};
pub use get_media_list::GetMediaListUseCase;
pub use get_reference_time::GetReferenceTimeUseCase;
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use relay_message::RelayMessageUseCase;
