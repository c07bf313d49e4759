//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//!
//! ## ロックの構成
//!
//! ```text
//! RwLock<HashMap<RoomId, Arc<Mutex<RoomSlot>>>>
//!   └ ルームの検索・作成・削除のときだけ取得するレジストリのロック
//!       └ ルームごとの Mutex（メンバーシップの読み書き）
//! ```
//!
//! ブロードキャスト対象の取得はレジストリを読み取りロックで一瞬だけ参照し、
//! 以降はルームごとのロックのみを使うため、異なるルーム同士は競合しない。
//! leave もルームのロックだけで退出を済ませ、空になったスロットを外すときだけ
//! レジストリの書き込みロックを取る（ルームのロックは先に手放す）。
//!
//! ルームが空になって削除された後に、削除前に取得した `Arc` 経由で join が
//! 来る可能性があるため、削除済みのスロットには `closed` フラグを立て、
//! join 側は作り直したスロットで再試行する。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    Participant, ParticipantId, RepositoryError, Room, RoomId, RoomRepository, Timestamp,
};
use tandem_shared::time::get_timestamp_millis;

struct RoomSlot {
    room: Room,
    closed: bool,
}

type SharedSlot = Arc<Mutex<RoomSlot>>;

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    /// ルームレジストリ
    rooms: RwLock<HashMap<RoomId, SharedSlot>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_slot(&self, room_id: &RoomId) -> Option<SharedSlot> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned()
    }

    async fn find_or_create_slot(&self, room_id: &RoomId) -> SharedSlot {
        if let Some(slot) = self.find_slot(room_id).await {
            return slot;
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!("Room '{}' created", room_id);
                Arc::new(Mutex::new(RoomSlot {
                    room: Room::new(room_id.clone(), Timestamp::new(get_timestamp_millis())),
                    closed: false,
                }))
            })
            .clone()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<(), RepositoryError> {
        loop {
            let slot = self.find_or_create_slot(room_id).await;
            let mut slot = slot.lock().await;
            if slot.closed {
                // 直前に削除されたルーム。レジストリから外れるのを待って再試行する
                drop(slot);
                tokio::task::yield_now().await;
                continue;
            }
            slot.room.add_participant(participant)?;
            return Ok(());
        }
    }

    async fn leave(&self, room_id: &RoomId, participant_id: &ParticipantId) -> Option<Participant> {
        let shared = self.find_slot(room_id).await?;
        let (removed, emptied) = {
            let mut slot = shared.lock().await;
            if slot.closed {
                return None;
            }
            let removed = slot.room.remove_participant(participant_id);
            let emptied = slot.room.is_empty();
            if emptied {
                // join はこのスロットを使わず、作り直したスロットで再試行する
                slot.closed = true;
            }
            (removed, emptied)
        };

        if emptied {
            let mut rooms = self.rooms.write().await;
            if rooms
                .get(room_id)
                .is_some_and(|current| Arc::ptr_eq(current, &shared))
            {
                rooms.remove(room_id);
                tracing::info!("Room '{}' is empty and was removed", room_id);
            }
        }
        removed
    }

    async fn member_ids(&self, room_id: &RoomId) -> Vec<ParticipantId> {
        match self.find_slot(room_id).await {
            Some(slot) => slot.lock().await.room.participant_ids(),
            None => Vec::new(),
        }
    }

    async fn get_room(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let slot = self
            .find_slot(room_id)
            .await
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
        let slot = slot.lock().await;
        if slot.closed {
            return Err(RepositoryError::RoomNotFound(room_id.as_str().to_string()));
        }
        Ok(slot.room.clone())
    }

    async fn list_rooms(&self) -> Vec<Room> {
        let slots: Vec<SharedSlot> = {
            let rooms = self.rooms.read().await;
            rooms.values().cloned().collect()
        };

        let mut result = Vec::with_capacity(slots.len());
        for slot in slots {
            let slot = slot.lock().await;
            if !slot.closed {
                result.push(slot.room.clone());
            }
        }
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    async fn count_rooms(&self) -> usize {
        self.rooms.read().await.len()
    }
}
