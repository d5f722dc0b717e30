//! The shared room document.
//!
//! A room is the only structure two independent actors touch. Writes follow
//! a single-writer-per-transition discipline: the guest writes
//! WAITING -> READY, the host writes READY -> FLIPPING -> FINISHED and is
//! the only one who deletes.

use serde::{Deserialize, Serialize};

use crate::game::CoinSide;
use crate::items::buffs::ActiveBuffs;
use crate::items::shop::SkinId;
use crate::player::Player;

/// Level shown for a stealth-redacted participant.
pub const REDACTED_LEVEL: i32 = -1;

/// Name shown for a stealth-redacted participant.
pub const REDACTED_NAME: &str = "Unknown";

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Room lifecycle. Cancellation deletes the document and is never a stored
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Host waiting for a guest.
    Waiting,
    /// Guest present, both stakes committed.
    Ready,
    /// Result drawn and written; clients animate.
    Flipping,
    /// Render delay elapsed; clients settle.
    Finished,
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

/// A participant's identity and buffs, frozen at create/join time.
///
/// Snapshots, not live references: buff changes after commit never affect
/// an in-progress room. Stealth redaction happens here, once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantSnapshot {
    pub id: String,
    pub name: String,
    /// `REDACTED_LEVEL` when stealth was active at snapshot time.
    pub level: i32,
    pub skin: SkinId,
    pub buffs: ActiveBuffs,
    pub god_mode: bool,
}

impl Default for ParticipantSnapshot {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            level: 1,
            skin: SkinId::Default,
            buffs: ActiveBuffs::default(),
            god_mode: false,
        }
    }
}

impl ParticipantSnapshot {
    /// Freeze a player's identity and buffs, applying stealth redaction.
    pub fn capture(player: &Player) -> Self {
        let stealth = player.active_buffs.stealth;
        Self {
            id: player.id.clone(),
            name: if stealth {
                REDACTED_NAME.to_string()
            } else {
                player.name.clone()
            },
            level: if stealth {
                REDACTED_LEVEL
            } else {
                player.level as i32
            },
            skin: player.equipped_skin,
            buffs: player.active_buffs.clone(),
            god_mode: player.god_mode,
        }
    }
}

// =============================================================================
// ROOM
// =============================================================================

/// One PvP match document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    /// Short human-typeable code, unique among live rooms.
    pub id: String,
    pub host: ParticipantSnapshot,
    pub guest: Option<ParticipantSnapshot>,
    /// Fixed at creation; both stakes are debited before READY.
    pub bet_amount: i64,
    pub status: RoomStatus,
    /// Host's chosen side, set when FLIPPING begins.
    pub selected_side: Option<CoinSide>,
    /// Drawn result, written in the same update as FLIPPING.
    pub result: Option<CoinSide>,
    pub created_at_ms: i64,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            id: String::new(),
            host: ParticipantSnapshot::default(),
            guest: None,
            bet_amount: 0,
            status: RoomStatus::Waiting,
            selected_side: None,
            result: None,
            created_at_ms: 0,
        }
    }
}

impl Room {
    /// New WAITING room with the host snapshot already frozen.
    pub fn open(id: String, host: ParticipantSnapshot, bet_amount: i64, now_ms: i64) -> Self {
        Self {
            id,
            host,
            bet_amount,
            created_at_ms: now_ms,
            ..Self::default()
        }
    }

    /// Whether `player_id` is this room's host.
    pub fn is_host(&self, player_id: &str) -> bool {
        self.host.id == player_id
    }

    /// The buff snapshot belonging to the given role.
    pub fn snapshot_for(&self, is_host: bool) -> Option<&ParticipantSnapshot> {
        if is_host {
            Some(&self.host)
        } else {
            self.guest.as_ref()
        }
    }
}

/// Whether the host won, given the committed draw.
///
/// Both clients must compute the same value for the same inputs; the guest
/// simply negates the host's predicate.
pub fn i_won(result: CoinSide, selected_side: CoinSide, is_host: bool) -> bool {
    (result == selected_side) == is_host
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_redacts_stealth_once() {
        let mut p = Player::new("p1", "Ada");
        p.level = 9;
        p.active_buffs.stealth = true;
        let snap = ParticipantSnapshot::capture(&p);
        assert_eq!(snap.name, REDACTED_NAME);
        assert_eq!(snap.level, REDACTED_LEVEL);
        // Buffs still ride along for resolution.
        assert!(snap.buffs.stealth);

        // Deactivating stealth later must not unredact the snapshot.
        p.active_buffs.stealth = false;
        assert_eq!(snap.name, REDACTED_NAME);
    }

    #[test]
    fn test_snapshot_plain_capture() {
        let mut p = Player::new("p2", "Bo");
        p.level = 4;
        let snap = ParticipantSnapshot::capture(&p);
        assert_eq!(snap.name, "Bo");
        assert_eq!(snap.level, 4);
        assert!(!snap.god_mode);
    }

    #[test]
    fn test_i_won_symmetry() {
        for result in [CoinSide::Heads, CoinSide::Tails] {
            for selected in [CoinSide::Heads, CoinSide::Tails] {
                let host = i_won(result, selected, true);
                let guest = i_won(result, selected, false);
                // Exactly one side wins.
                assert_ne!(host, guest);
                assert_eq!(host, result == selected);
            }
        }
    }

    #[test]
    fn test_partial_room_document_defaults() {
        let room: Room = serde_json::from_str(r#"{"id":"1234","bet_amount":100}"#).unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(room.guest.is_none());
        assert!(room.result.is_none());
    }
}
