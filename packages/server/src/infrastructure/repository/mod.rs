//! Repository の実装
//!
//! - `inmemory`: プロセス内のメンバーシップ表（再起動で消える）

pub mod inmemory;

pub use inmemory::InMemoryRoomRepository;
