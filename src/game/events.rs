//! Game Events
//!
//! Discrete, timestamped notifications for the UI layer. The engine only
//! emits these; rendering and timing belong to the consumer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::CoinSide;
use crate::items::shop::ItemId;
use crate::quests::achievements::AchievementId;
use crate::quests::daily::QuestKind;

/// Event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Level increased.
    LevelUp {
        new_level: u32,
        reward_money: i64,
        bonus_item: Option<ItemId>,
    },

    /// Achievement predicate fired for the first time.
    AchievementUnlocked {
        id: AchievementId,
        reward_money: i64,
        reward_xp: u64,
    },

    /// A daily quest hit its target.
    QuestCompleted {
        kind: QuestKind,
        reward_money: i64,
        reward_xp: u64,
    },

    /// A toggleable buff changed state.
    BuffToggled { item: ItemId, active: bool },

    /// A solo wager settled.
    WagerResolved {
        won: bool,
        /// Profit on a win, realized loss on a loss.
        amount: i64,
        result: CoinSide,
    },

    /// A PvP duel settled for this player.
    PvpResolved {
        won: bool,
        amount: i64,
        opponent: String,
    },

    /// A daily login reward is claimable.
    LoginBonusAvailable {
        streak: u32,
        reward_money: i64,
        reward_xp: u64,
    },

    /// The daily login reward was claimed.
    LoginBonusClaimed { streak: u32, reward_money: i64 },

    /// The hourly bonus was claimed.
    HourlyBonusClaimed { amount: i64 },
}

/// A timestamped event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub at: DateTime<Utc>,
    pub data: GameEventData,
}

impl GameEvent {
    /// Stamp an event with the current wall clock.
    pub fn now(data: GameEventData) -> Self {
        Self {
            at: Utc::now(),
            data,
        }
    }
}
