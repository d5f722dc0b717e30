//! Shop catalog.
//!
//! Items are priced in spendable XP and gated by level. Lifetime XP is
//! untouched by purchases, so buying can never lower a level.

use serde::{Deserialize, Serialize};

use crate::items::buffs::BuffKind;

// =============================================================================
// ITEM IDENTITY
// =============================================================================

/// Cosmetic coin skins. Unlocks are additive and permanent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkinId {
    #[default]
    Default,
    Gold,
    Neon,
}

/// Everything the shop sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemId {
    /// A toggleable buff, held in inventory until activated.
    Buff(BuffKind),
    /// Instant: 50/50 gain 50_000 XP or lose 25_000 spendable XP.
    GambleBox,
    /// Instant: predicts the next coin side (non-binding).
    FlipHint,
    /// Cosmetic unlock.
    Skin(SkinId),
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Buff(kind) => write!(f, "{kind}"),
            ItemId::GambleBox => write!(f, "gamble_box"),
            ItemId::FlipHint => write!(f, "flip_hint"),
            ItemId::Skin(SkinId::Default) => write!(f, "skin_default"),
            ItemId::Skin(SkinId::Gold) => write!(f, "skin_gold"),
            ItemId::Skin(SkinId::Neon) => write!(f, "skin_neon"),
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// One purchasable catalog row.
#[derive(Debug, Clone, Copy)]
pub struct ShopEntry {
    pub id: ItemId,
    pub name: &'static str,
    /// Price in spendable XP.
    pub price: u64,
    /// Minimum player level to buy.
    pub min_level: u32,
}

/// The full catalog, cheapest consumables first.
pub const SHOP_CATALOG: [ShopEntry; 18] = [
    ShopEntry { id: ItemId::Buff(BuffKind::XpBoost), name: "Sage's Wisdom", price: 150, min_level: 1 },
    ShopEntry { id: ItemId::FlipHint, name: "Angel's Whisper", price: 300, min_level: 2 },
    ShopEntry { id: ItemId::Buff(BuffKind::Insurance), name: "Insurance", price: 800, min_level: 3 },
    ShopEntry { id: ItemId::Buff(BuffKind::Critical), name: "Lucky Clover", price: 1_500, min_level: 4 },
    ShopEntry { id: ItemId::Buff(BuffKind::Stealth), name: "Shadow Cloak", price: 2_500, min_level: 5 },
    ShopEntry { id: ItemId::GambleBox, name: "Pandora's Chest", price: 2_000, min_level: 5 },
    ShopEntry { id: ItemId::Buff(BuffKind::LuckyCharm), name: "Golden Horseshoe", price: 4_000, min_level: 6 },
    ShopEntry { id: ItemId::Buff(BuffKind::StreakShield), name: "Amulet of Keeping", price: 6_000, min_level: 8 },
    ShopEntry { id: ItemId::Buff(BuffKind::LoadedDice), name: "Loaded Dice", price: 10_000, min_level: 10 },
    ShopEntry { id: ItemId::Buff(BuffKind::Vampirism), name: "Vampirism", price: 15_000, min_level: 12 },
    ShopEntry { id: ItemId::Buff(BuffKind::Magnet), name: "Victory Magnet", price: 25_000, min_level: 15 },
    ShopEntry { id: ItemId::Buff(BuffKind::Oracle), name: "Oracle's Eye", price: 50_000, min_level: 25 },
    ShopEntry { id: ItemId::Buff(BuffKind::Rewind), name: "Time Rewind", price: 30_000, min_level: 30 },
    ShopEntry { id: ItemId::Buff(BuffKind::Phoenix), name: "Phoenix", price: 10_000, min_level: 35 },
    ShopEntry { id: ItemId::Buff(BuffKind::Titan), name: "Titan", price: 75_000, min_level: 40 },
    ShopEntry { id: ItemId::Buff(BuffKind::FarSight), name: "Eye of God", price: 150_000, min_level: 50 },
    ShopEntry { id: ItemId::Skin(SkinId::Gold), name: "Oligarch Coin", price: 5_000, min_level: 7 },
    ShopEntry { id: ItemId::Skin(SkinId::Neon), name: "Cyber Coin", price: 10_000, min_level: 10 },
];

/// Catalog lookup.
pub fn catalog_entry(id: ItemId) -> Option<&'static ShopEntry> {
    SHOP_CATALOG.iter().find(|e| e.id == id)
}

// =============================================================================
// GAMBLE BOX CONSTANTS
// =============================================================================

/// XP granted on a winning gamble box.
pub const GAMBLE_BOX_GAIN_XP: u64 = 50_000;
/// Spendable XP removed on a losing gamble box (floored at zero).
pub const GAMBLE_BOX_LOSS_XP: u64 = 25_000;

// =============================================================================
// ERRORS
// =============================================================================

/// Shop and item-use errors. All reject before any state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShopError {
    /// Level requirement not met.
    #[error("requires level {required}")]
    LevelTooLow { required: u32 },

    /// Not enough spendable XP.
    #[error("insufficient XP: need {price}, have {available}")]
    InsufficientXp { price: u64, available: u64 },

    /// Skin already unlocked.
    #[error("skin already owned")]
    SkinAlreadyOwned,

    /// Skin not unlocked yet.
    #[error("skin not owned")]
    SkinNotOwned,

    /// Item not in the catalog.
    #[error("unknown item")]
    UnknownItem,

    /// Item not held in inventory.
    #[error("item not in inventory")]
    NotInInventory,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique() {
        for (i, a) in SHOP_CATALOG.iter().enumerate() {
            for b in &SHOP_CATALOG[i + 1..] {
                assert_ne!(a.id, b.id, "duplicate catalog entry {}", a.id);
            }
        }
    }

    #[test]
    fn test_every_buff_kind_is_sold() {
        for &kind in &BuffKind::ALL {
            assert!(
                catalog_entry(ItemId::Buff(kind)).is_some(),
                "no catalog entry for {kind}"
            );
        }
    }

    #[test]
    fn test_item_ids_form_a_total_order() {
        // Ids key ordered collections (sorted inventories, sets), so the
        // whole enum, skins included, must sort.
        let mut ids: Vec<ItemId> = SHOP_CATALOG.iter().map(|e| e.id).collect();
        ids.sort();
        let set: std::collections::BTreeSet<ItemId> = ids.iter().copied().collect();
        assert_eq!(set.len(), SHOP_CATALOG.len());
        assert!(ItemId::Skin(SkinId::Gold) < ItemId::Skin(SkinId::Neon));
    }

    #[test]
    fn test_default_skin_is_not_sold() {
        assert!(catalog_entry(ItemId::Skin(SkinId::Default)).is_none());
    }

    #[test]
    fn test_level_gates_within_range() {
        for entry in &SHOP_CATALOG {
            assert!((1..=50).contains(&entry.min_level));
        }
    }
}
