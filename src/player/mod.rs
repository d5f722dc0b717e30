//! The player aggregate.
//!
//! One logical actor owns and mutates a `Player` at a time; PvP opponents
//! only ever touch the shared room, never this struct. Every field defaults
//! so a partial remote document coerces cleanly instead of faulting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::rng::GameRng;
use crate::economy::{
    level_for_lifetime_xp, INITIAL_BALANCE, LEVEL_UP_REWARD_PER_LEVEL,
};
use crate::game::CoinSide;
use crate::items::buffs::ActiveBuffs;
use crate::items::shop::{ItemId, SkinId};
use crate::quests::daily::Quest;
use crate::quests::achievements::AchievementId;

/// History entries kept per player, newest first.
pub const HISTORY_CAP: usize = 50;

// =============================================================================
// STATS & HISTORY
// =============================================================================

/// Lifetime counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub total_wins: u64,
    pub total_games: u64,
    pub current_win_streak: u32,
    pub max_win_streak: u32,
    /// Largest single stake ever placed.
    pub max_bet: i64,
    /// Consecutive hourly-bonus claims.
    pub bonus_streak: u32,
}

/// Which table a history entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameKind {
    Solo,
    Pvp,
}

/// One resolved game in the bounded history ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub kind: GameKind,
    pub won: bool,
    /// Profit on a win, realized loss on a loss.
    pub amount: i64,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub opponent: Option<String>,
}

/// One stack of an owned item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item: ItemId,
    pub count: u32,
}

// =============================================================================
// LEVEL-UP REWARD
// =============================================================================

/// What a level-up paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub reward_money: i64,
    pub bonus_item: Option<ItemId>,
}

/// Pool the level-up bonus item is drawn from.
const LEVEL_UP_ITEM_POOL: [ItemId; 3] = [
    ItemId::Buff(crate::items::buffs::BuffKind::XpBoost),
    ItemId::FlipHint,
    ItemId::Buff(crate::items::buffs::BuffKind::Insurance),
];

// =============================================================================
// PLAYER
// =============================================================================

/// Root aggregate, one per identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Primary currency. Never negative; every debit is bounds-checked
    /// before commit.
    pub balance: i64,
    /// Shop currency. Spent on purchases.
    pub spendable_xp: u64,
    /// Monotone; drives `level`. Purchases never reduce it.
    pub lifetime_xp: u64,
    /// Derived from `lifetime_xp`, cached for display.
    pub level: u32,
    pub stats: PlayerStats,
    pub inventory: Vec<InventoryEntry>,
    pub active_buffs: ActiveBuffs,
    pub quests: Vec<Quest>,
    /// Creation timestamp of the current quest batch.
    pub quests_issued_at_ms: i64,
    pub achievements: BTreeSet<AchievementId>,
    /// Newest first, capped at `HISTORY_CAP`.
    pub history: Vec<HistoryEntry>,
    pub unlocked_skins: Vec<SkinId>,
    pub equipped_skin: SkinId,
    pub login_streak: u32,
    pub last_login_ms: i64,
    pub last_bonus_claim_ms: i64,
    /// Administrative override: forces every win draw.
    pub god_mode: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            balance: INITIAL_BALANCE,
            spendable_xp: 0,
            lifetime_xp: 0,
            level: 1,
            stats: PlayerStats::default(),
            inventory: Vec::new(),
            active_buffs: ActiveBuffs::default(),
            quests: Vec::new(),
            quests_issued_at_ms: 0,
            achievements: BTreeSet::new(),
            history: Vec::new(),
            unlocked_skins: vec![SkinId::Default],
            equipped_skin: SkinId::Default,
            login_streak: 0,
            last_login_ms: 0,
            last_bonus_claim_ms: 0,
            god_mode: false,
        }
    }
}

impl Player {
    /// Fresh aggregate for a newly resolved identity.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Restore defaults, keeping identity.
    pub fn reset(&mut self) {
        let id = std::mem::take(&mut self.id);
        let name = std::mem::take(&mut self.name);
        *self = Self::new(id, name);
    }

    // -------------------------------------------------------------------------
    // XP
    // -------------------------------------------------------------------------

    /// Credit XP to both currencies and recompute level.
    ///
    /// Doubles the amount while `xp_boost` is active. Level can only rise
    /// here; a level-up grants `new_level * 1000` money plus a 50% chance
    /// of one item from a small pool.
    pub fn apply_xp(&mut self, amount: u64, rng: &mut GameRng) -> Option<LevelUp> {
        let amount = if self.active_buffs.xp_boost {
            amount * 2
        } else {
            amount
        };
        self.spendable_xp += amount;
        self.lifetime_xp += amount;

        let computed = level_for_lifetime_xp(self.lifetime_xp);
        if computed <= self.level {
            return None;
        }
        self.level = computed;

        let reward_money = computed as i64 * LEVEL_UP_REWARD_PER_LEVEL;
        self.balance += reward_money;

        let bonus_item = if rng.roll_bp(5_000) {
            rng.choose(&LEVEL_UP_ITEM_POOL).copied().map(|item| {
                self.add_item(item, 1);
                item
            })
        } else {
            None
        };

        Some(LevelUp {
            new_level: computed,
            reward_money,
            bonus_item,
        })
    }

    // -------------------------------------------------------------------------
    // INVENTORY
    // -------------------------------------------------------------------------

    /// Units of `item` currently held.
    pub fn item_count(&self, item: ItemId) -> u32 {
        self.inventory
            .iter()
            .find(|e| e.item == item)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Add units of an item.
    pub fn add_item(&mut self, item: ItemId, count: u32) {
        if count == 0 {
            return;
        }
        match self.inventory.iter_mut().find(|e| e.item == item) {
            Some(entry) => entry.count += count,
            None => self.inventory.push(InventoryEntry { item, count }),
        }
    }

    /// Remove one unit; the entry disappears at zero. Returns false if the
    /// item was not held.
    pub fn consume_item(&mut self, item: ItemId) -> bool {
        let Some(idx) = self.inventory.iter().position(|e| e.item == item) else {
            return false;
        };
        self.inventory[idx].count -= 1;
        if self.inventory[idx].count == 0 {
            self.inventory.remove(idx);
        }
        true
    }

    // -------------------------------------------------------------------------
    // HISTORY & STATS
    // -------------------------------------------------------------------------

    /// Prepend a history entry, dropping the oldest past the cap.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.insert(0, entry);
        self.history.truncate(HISTORY_CAP);
    }

    /// Record a win for streak bookkeeping.
    pub fn record_win(&mut self) {
        self.stats.total_wins += 1;
        self.stats.current_win_streak += 1;
        self.stats.max_win_streak = self.stats.max_win_streak.max(self.stats.current_win_streak);
    }

    /// Record a loss; the streak survives only behind a streak shield.
    pub fn record_loss(&mut self, shielded: bool) {
        if !shielded {
            self.stats.current_win_streak = 0;
        }
    }

    /// PvP wins currently visible in the history ring.
    pub fn pvp_wins_in_history(&self) -> usize {
        self.history
            .iter()
            .filter(|h| h.kind == GameKind::Pvp && h.won)
            .count()
    }

    /// The coin side the active prediction points at, if a flip hint was
    /// consumed this wager.
    pub fn predicted_side(&self) -> Option<CoinSide> {
        self.active_buffs.predicted_side
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::buffs::BuffKind;

    fn rng() -> GameRng {
        GameRng::new(7)
    }

    #[test]
    fn test_new_player_defaults() {
        let p = Player::new("p1", "Ada");
        assert_eq!(p.balance, INITIAL_BALANCE);
        assert_eq!(p.level, 1);
        assert_eq!(p.unlocked_skins, vec![SkinId::Default]);
        assert!(p.history.is_empty());
    }

    #[test]
    fn test_apply_xp_zero_is_noop_on_level_and_balance() {
        let mut p = Player::new("p1", "Ada");
        let before_balance = p.balance;
        assert!(p.apply_xp(0, &mut rng()).is_none());
        assert!(p.apply_xp(0, &mut rng()).is_none());
        assert_eq!(p.level, 1);
        assert_eq!(p.balance, before_balance);
    }

    #[test]
    fn test_apply_xp_levels_up_with_reward() {
        let mut p = Player::new("p1", "Ada");
        let up = p.apply_xp(100, &mut rng()).unwrap();
        assert_eq!(up.new_level, 2);
        assert_eq!(up.reward_money, 2 * LEVEL_UP_REWARD_PER_LEVEL);
        assert_eq!(p.level, 2);
        assert_eq!(p.balance, INITIAL_BALANCE + 2_000);
        assert_eq!(p.spendable_xp, 100);
        assert_eq!(p.lifetime_xp, 100);
    }

    #[test]
    fn test_apply_xp_never_lowers_level() {
        let mut p = Player::new("p1", "Ada");
        p.apply_xp(600, &mut rng());
        assert_eq!(p.level, 3);
        // Spending XP in the shop reduces only the spendable pool.
        p.spendable_xp = 0;
        assert!(p.apply_xp(0, &mut rng()).is_none());
        assert_eq!(p.level, 3);
    }

    #[test]
    fn test_xp_boost_doubles_credit() {
        let mut p = Player::new("p1", "Ada");
        p.active_buffs.xp_boost = true;
        p.apply_xp(50, &mut rng());
        assert_eq!(p.lifetime_xp, 100);
        assert_eq!(p.level, 2);
    }

    #[test]
    fn test_inventory_round_trip() {
        let mut p = Player::new("p1", "Ada");
        let item = ItemId::Buff(BuffKind::Insurance);
        assert!(!p.consume_item(item));
        p.add_item(item, 2);
        assert_eq!(p.item_count(item), 2);
        assert!(p.consume_item(item));
        assert!(p.consume_item(item));
        assert_eq!(p.item_count(item), 0);
        // Zero-count entries are removed outright.
        assert!(p.inventory.is_empty());
    }

    #[test]
    fn test_history_ring_is_bounded() {
        let mut p = Player::new("p1", "Ada");
        for i in 0..60 {
            p.push_history(HistoryEntry {
                id: i.to_string(),
                kind: GameKind::Solo,
                won: true,
                amount: i,
                timestamp_ms: i,
                opponent: None,
            });
        }
        assert_eq!(p.history.len(), HISTORY_CAP);
        // Newest first.
        assert_eq!(p.history[0].id, "59");
        assert_eq!(p.history.last().unwrap().id, "10");
    }

    #[test]
    fn test_streak_bookkeeping() {
        let mut p = Player::new("p1", "Ada");
        p.record_win();
        p.record_win();
        assert_eq!(p.stats.current_win_streak, 2);
        assert_eq!(p.stats.max_win_streak, 2);
        p.record_loss(true);
        assert_eq!(p.stats.current_win_streak, 2);
        p.record_loss(false);
        assert_eq!(p.stats.current_win_streak, 0);
        assert_eq!(p.stats.max_win_streak, 2);
    }

    #[test]
    fn test_partial_document_coerces() {
        let p: Player = serde_json::from_str(r#"{"id":"p9","balance":250}"#).unwrap();
        assert_eq!(p.id, "p9");
        assert_eq!(p.balance, 250);
        assert_eq!(p.level, 1);
        assert!(p.quests.is_empty());
        assert!(p.achievements.is_empty());
    }

    #[test]
    fn test_reset_keeps_identity() {
        let mut p = Player::new("p1", "Ada");
        p.balance = 999_999;
        p.god_mode = true;
        p.reset();
        assert_eq!(p.id, "p1");
        assert_eq!(p.name, "Ada");
        assert_eq!(p.balance, INITIAL_BALANCE);
        assert!(!p.god_mode);
    }
}
