//! In-memory reference store.
//!
//! Backs the demo binary and the protocol tests. Deliberately mirrors the
//! contract's weak semantics: every call takes and releases its own lock,
//! so nothing spans a read and a subsequent write except the explicit
//! status precondition on room patches.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::player::Player;
use crate::pvp::room::{Room, RoomStatus};
use crate::store::{
    ChatMessage, GameStore, LeaderboardRow, PublicLogEntry, RoomPatch, StoreError,
};

/// Ticker feed retention.
pub const PUBLIC_LOG_CAP: usize = 100;

/// WAITING rooms older than this are reclaimed by `sweep_stale_rooms`.
pub const ROOM_EXPIRY_MS: i64 = 10 * 60 * 1000;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Inner {
    players: BTreeMap<String, Player>,
    rooms: BTreeMap<String, Room>,
    room_channels: BTreeMap<String, broadcast::Sender<Option<Room>>>,
    public_log: Vec<PublicLogEntry>,
    chat: Vec<ChatMessage>,
    admins: BTreeSet<String>,
}

/// Shared in-memory store handle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    lobby_tx: Arc<RwLock<Option<broadcast::Sender<Vec<Room>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete orphaned WAITING rooms past the expiry window.
    ///
    /// Reclamation policy for abandoned rooms; subscribers observe the
    /// deletion and refund themselves.
    pub async fn sweep_stale_rooms(&self, now_ms: i64) -> usize {
        let mut inner = self.inner.write().await;
        let stale: Vec<String> = inner
            .rooms
            .values()
            .filter(|r| r.status == RoomStatus::Waiting && now_ms - r.created_at_ms >= ROOM_EXPIRY_MS)
            .map(|r| r.id.clone())
            .collect();
        for id in &stale {
            inner.rooms.remove(id);
            if let Some(tx) = inner.room_channels.get(id) {
                let _ = tx.send(None);
            }
            info!(room = %id, "swept stale room");
        }
        let count = stale.len();
        drop(inner);
        if count > 0 {
            self.notify_lobby().await;
        }
        count
    }

    async fn notify_room(&self, room_id: &str) {
        let inner = self.inner.read().await;
        if let Some(tx) = inner.room_channels.get(room_id) {
            let _ = tx.send(inner.rooms.get(room_id).cloned());
        }
    }

    async fn notify_lobby(&self) {
        let waiting = {
            let inner = self.inner.read().await;
            inner
                .rooms
                .values()
                .filter(|r| r.status == RoomStatus::Waiting)
                .cloned()
                .collect::<Vec<_>>()
        };
        let guard = self.lobby_tx.read().await;
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(waiting);
        }
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn get_player(&self, id: &str) -> Result<Option<Player>, StoreError> {
        Ok(self.inner.read().await.players.get(id).cloned())
    }

    async fn put_player(&self, player: &Player) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .players
            .insert(player.id.clone(), player.clone());
        Ok(())
    }

    async fn create_room(&self, room: Room) -> Result<String, StoreError> {
        let id = room.id.clone();
        {
            let mut inner = self.inner.write().await;
            if inner.rooms.contains_key(&id) {
                return Err(StoreError::Conflict);
            }
            debug!(room = %id, bet = room.bet_amount, "room created");
            inner.rooms.insert(id.clone(), room);
        }
        self.notify_room(&id).await;
        self.notify_lobby().await;
        Ok(id)
    }

    async fn read_room(&self, room_id: &str) -> Result<Option<Room>, StoreError> {
        Ok(self.inner.read().await.rooms.get(room_id).cloned())
    }

    async fn write_room(&self, room_id: &str, patch: RoomPatch) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.write().await;
            let room = inner
                .rooms
                .get_mut(room_id)
                .ok_or(StoreError::RoomNotFound)?;
            if let Some(expected) = patch.expect_status {
                if room.status != expected {
                    return Err(StoreError::Conflict);
                }
            }
            patch.apply(room);
        }
        self.notify_room(room_id).await;
        self.notify_lobby().await;
        Ok(())
    }

    async fn delete_room(&self, room_id: &str) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.write().await;
            inner.rooms.remove(room_id);
            if let Some(tx) = inner.room_channels.get(room_id) {
                let _ = tx.send(None);
            }
        }
        self.notify_lobby().await;
        Ok(())
    }

    async fn subscribe_room(
        &self,
        room_id: &str,
    ) -> Result<broadcast::Receiver<Option<Room>>, StoreError> {
        let mut inner = self.inner.write().await;
        let tx = inner
            .room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(tx.subscribe())
    }

    async fn waiting_rooms(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .rooms
            .values()
            .filter(|r| r.status == RoomStatus::Waiting)
            .cloned()
            .collect())
    }

    async fn subscribe_lobby(&self) -> Result<broadcast::Receiver<Vec<Room>>, StoreError> {
        let mut guard = self.lobby_tx.write().await;
        let tx = guard.get_or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(tx.subscribe())
    }

    async fn append_public_log(&self, entry: PublicLogEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.public_log.insert(0, entry);
        inner.public_log.truncate(PUBLIC_LOG_CAP);
        Ok(())
    }

    async fn public_log(&self) -> Result<Vec<PublicLogEntry>, StoreError> {
        Ok(self.inner.read().await.public_log.clone())
    }

    async fn top_balances(&self, limit: usize) -> Result<Vec<LeaderboardRow>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<LeaderboardRow> = inner
            .players
            .values()
            .map(|p| LeaderboardRow {
                id: p.id.clone(),
                name: p.name.clone(),
                balance: p.balance,
                level: p.level,
            })
            .collect();
        rows.sort_by(|a, b| b.balance.cmp(&a.balance));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn append_chat(&self, message: ChatMessage) -> Result<(), StoreError> {
        self.inner.write().await.chat.push(message);
        Ok(())
    }

    async fn chat_log(&self) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self.inner.read().await.chat.clone())
    }

    async fn clear_chat(&self) -> Result<(), StoreError> {
        self.inner.write().await.chat.clear();
        Ok(())
    }

    async fn grant_admin(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.admins.insert(id.to_string());
        Ok(())
    }

    async fn revoke_admin(&self, id: &str) -> Result<(), StoreError> {
        self.inner.write().await.admins.remove(id);
        Ok(())
    }

    async fn is_admin(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.admins.contains(id))
    }

    async fn admins(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.inner.read().await.admins.iter().cloned().collect())
    }

    async fn reset_global(&self) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.write().await;
            let room_ids: Vec<String> = inner.rooms.keys().cloned().collect();
            inner.rooms.clear();
            for id in room_ids {
                if let Some(tx) = inner.room_channels.get(&id) {
                    let _ = tx.send(None);
                }
            }
            inner.public_log.clear();
            inner.chat.clear();
        }
        self.notify_lobby().await;
        info!("global state reset");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
