//! WebSocket を使った MessagePusher 実装
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//!
//! 送信チャンネルはルームごとに別のロックで保持します。レジストリのロックは
//! ルームの検索・作成・削除のときだけ取得するため、あるルームでの登録・登録解除が
//! 他のルームへの送信を待たせることはありません。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    BroadcastReport, MessagePushError, MessagePusher, ParticipantId, PusherChannel, RoomId,
};

/// 1 ルーム分の送信チャンネル
#[derive(Default)]
struct RoomChannels {
    senders: HashMap<ParticipantId, PusherChannel>,
    /// レジストリから外された（外される）ルーム
    closed: bool,
}

type SharedChannels = Arc<RwLock<RoomChannels>>;

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// ルームごとの、接続中の参加者と対応する WebSocket sender のマップ
    rooms: RwLock<HashMap<RoomId, SharedChannels>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_room(&self, room_id: &RoomId) -> Option<SharedChannels> {
        self.rooms.read().await.get(room_id).cloned()
    }

    async fn find_or_create_room(&self, room_id: &RoomId) -> SharedChannels {
        if let Some(room) = self.find_room(room_id).await {
            return room;
        }
        let mut rooms = self.rooms.write().await;
        rooms.entry(room_id.clone()).or_default().clone()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        sender: PusherChannel,
    ) {
        loop {
            let shared = self.find_or_create_room(room_id).await;
            let mut room = shared.write().await;
            if room.closed {
                drop(room);
                tokio::task::yield_now().await;
                continue;
            }
            room.senders.insert(participant_id.clone(), sender);
            break;
        }
        tracing::debug!(
            "Participant '{}' registered to MessagePusher in room '{}'",
            participant_id,
            room_id
        );
    }

    async fn unregister_client(&self, room_id: &RoomId, participant_id: &ParticipantId) {
        let Some(shared) = self.find_room(room_id).await else {
            return;
        };
        let emptied = {
            let mut room = shared.write().await;
            room.senders.remove(participant_id);
            if room.senders.is_empty() && !room.closed {
                room.closed = true;
                true
            } else {
                false
            }
        };
        if emptied {
            let mut rooms = self.rooms.write().await;
            if rooms
                .get(room_id)
                .is_some_and(|current| Arc::ptr_eq(current, &shared))
            {
                rooms.remove(room_id);
            }
        }
        tracing::debug!(
            "Participant '{}' unregistered from MessagePusher in room '{}'",
            participant_id,
            room_id
        );
    }

    async fn push_to(
        &self,
        room_id: &RoomId,
        participant_id: &ParticipantId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let not_found = || MessagePushError::ClientNotFound(participant_id.as_str().to_string());
        let shared = self.find_room(room_id).await.ok_or_else(not_found)?;
        let room = shared.read().await;
        let sender = room.senders.get(participant_id).ok_or_else(not_found)?;

        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to participant '{}'", participant_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        room_id: &RoomId,
        targets: Vec<ParticipantId>,
        content: &str,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let Some(shared) = self.find_room(room_id).await else {
            return report;
        };
        let room = shared.read().await;

        for target in targets {
            match room.senders.get(&target) {
                Some(sender) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    if let Err(e) = sender.send(content.to_string()) {
                        tracing::warn!("Failed to push message to participant '{}': {}", target, e);
                        report.failed.push(target);
                    } else {
                        report.delivered.push(target);
                    }
                }
                None => {
                    // join 直後で sender の登録前、または切断処理中
                    tracing::debug!(
                        "Participant '{}' not registered during broadcast, skipping",
                        target
                    );
                }
            }
        }

        report
    }
}
