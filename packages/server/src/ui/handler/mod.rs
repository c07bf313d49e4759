//! Request handlers.

mod http;
mod websocket;

pub use http::{get_media_list, get_reference_time, get_room_detail, get_rooms, health_check};
pub use websocket::websocket_handler;
