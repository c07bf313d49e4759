//! Infrastructure 層
//!
//! ドメイン層の trait の具体的な実装と、外部とやり取りするための DTO を提供します。

pub mod dto;
pub mod media;
pub mod message_pusher;
pub mod repository;
