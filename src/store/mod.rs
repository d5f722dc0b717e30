//! The shared key-value store seam.
//!
//! The engine treats persistence as a generic document store with push
//! subscriptions: read and write are independent primitives with no
//! transaction spanning them. The one concession is a per-patch status
//! precondition on room writes, which is how the join race picks exactly
//! one winner (the losing guest compensates locally, it never writes).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::game::CoinSide;
use crate::player::{GameKind, Player};
use crate::pvp::room::{ParticipantSnapshot, Room, RoomStatus};

pub mod memory;

pub use memory::MemoryStore;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Partial room update. Only populated fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomPatch {
    /// Apply only if the stored status currently matches; otherwise the
    /// write fails with `StoreError::Conflict` and changes nothing.
    pub expect_status: Option<RoomStatus>,
    pub status: Option<RoomStatus>,
    pub guest: Option<ParticipantSnapshot>,
    pub selected_side: Option<CoinSide>,
    pub result: Option<CoinSide>,
}

impl RoomPatch {
    /// Apply to a room in place.
    pub fn apply(&self, room: &mut Room) {
        if let Some(status) = self.status {
            room.status = status;
        }
        if let Some(guest) = &self.guest {
            room.guest = Some(guest.clone());
        }
        if let Some(side) = self.selected_side {
            room.selected_side = Some(side);
        }
        if let Some(result) = self.result {
            room.result = Some(result);
        }
    }
}

/// One row of the public ticker feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicLogEntry {
    pub player_id: String,
    pub player_name: String,
    /// -1 when the player was stealth-redacted.
    pub player_level: i32,
    pub kind: GameKind,
    pub won: bool,
    pub amount: i64,
    pub timestamp_ms: i64,
}

/// One chat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub player_id: String,
    pub player_name: String,
    pub text: String,
    pub timestamp_ms: i64,
}

/// One leaderboard row, balance-descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub id: String,
    pub name: String,
    pub balance: i64,
    pub level: u32,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Store failures. Never fatal to the process; callers degrade or
/// compensate locally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No connectivity to the backing store.
    #[error("store unavailable")]
    Unavailable,

    /// Room document does not exist.
    #[error("room not found")]
    RoomNotFound,

    /// A patch precondition failed; nothing was written.
    #[error("conflicting room write")]
    Conflict,
}

// =============================================================================
// TRAIT
// =============================================================================

/// Async contract the engine requires from any backing store.
///
/// Subscriptions are push-based broadcast channels; duplicate delivery is
/// allowed, and consumers must stay idempotent.
#[async_trait]
pub trait GameStore: Send + Sync {
    // --- players ---
    async fn get_player(&self, id: &str) -> Result<Option<Player>, StoreError>;
    /// Full-document upsert; absent fields default on the next read.
    async fn put_player(&self, player: &Player) -> Result<(), StoreError>;

    // --- rooms ---
    async fn create_room(&self, room: Room) -> Result<String, StoreError>;
    async fn read_room(&self, room_id: &str) -> Result<Option<Room>, StoreError>;
    async fn write_room(&self, room_id: &str, patch: RoomPatch) -> Result<(), StoreError>;
    async fn delete_room(&self, room_id: &str) -> Result<(), StoreError>;
    /// `None` payloads signal deletion.
    async fn subscribe_room(
        &self,
        room_id: &str,
    ) -> Result<broadcast::Receiver<Option<Room>>, StoreError>;
    async fn waiting_rooms(&self) -> Result<Vec<Room>, StoreError>;
    async fn subscribe_lobby(&self) -> Result<broadcast::Receiver<Vec<Room>>, StoreError>;

    // --- public surfaces ---
    async fn append_public_log(&self, entry: PublicLogEntry) -> Result<(), StoreError>;
    async fn public_log(&self) -> Result<Vec<PublicLogEntry>, StoreError>;
    async fn top_balances(&self, limit: usize) -> Result<Vec<LeaderboardRow>, StoreError>;
    async fn append_chat(&self, message: ChatMessage) -> Result<(), StoreError>;
    async fn chat_log(&self) -> Result<Vec<ChatMessage>, StoreError>;
    async fn clear_chat(&self) -> Result<(), StoreError>;

    // --- privilege & administration ---
    async fn grant_admin(&self, id: &str) -> Result<(), StoreError>;
    async fn revoke_admin(&self, id: &str) -> Result<(), StoreError>;
    async fn is_admin(&self, id: &str) -> Result<bool, StoreError>;
    async fn admins(&self) -> Result<Vec<String>, StoreError>;
    /// Drop all rooms, the ticker, and chat. Player documents survive.
    async fn reset_global(&self) -> Result<(), StoreError>;
}
