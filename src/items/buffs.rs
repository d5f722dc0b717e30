//! Toggleable buff registry.
//!
//! Every buff is a named flag on the player. Activating one consumes a unit
//! of inventory; deactivating it before a wager refunds the unit, so a buff
//! can be banked without losing the item. All flags are force-cleared once
//! per resolved wager, win or lose.
//!
//! Probability and multiplier effects are basis-point constants attached to
//! the variant, so the resolvers never carry their own magic numbers.

use serde::{Deserialize, Serialize};

use crate::game::CoinSide;

// =============================================================================
// BUFF KINDS
// =============================================================================

/// The closed set of toggleable modifiers.
///
/// Exactly one flag exists per kind; an unknown item can not silently
/// toggle nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuffKind {
    /// Doubles XP from the next resolution.
    XpBoost,
    /// Halves the realized loss (floored).
    Insurance,
    /// Win multiplier 2.8x instead of the base 1.9x.
    LuckyCharm,
    /// 10% chance per win to override the multiplier to 5.0x.
    Critical,
    /// Redacts name and level in PvP room snapshots.
    Stealth,
    /// Solo win chance 90%; PvP chance shift 30%.
    Magnet,
    /// Solo win chance 100%; PvP chance shift 45%; consolation XP equal to
    /// the stake on a loss.
    Oracle,
    /// Loss reduced to zero, unconditionally.
    Rewind,
    /// Solo win chance 60%; PvP chance shift 10%.
    LoadedDice,
    /// Win streak survives a loss.
    StreakShield,
    /// PvP only: +10% of the stake on top of the win payout.
    Vampirism,
    /// 33% chance the loss is reduced to zero.
    Phoenix,
    /// PvP only: win multiplier 3.5x.
    Titan,
    /// PvP only: reveals the host's selected side to the holder.
    FarSight,
}

impl BuffKind {
    /// Every kind, in catalog order.
    pub const ALL: [BuffKind; 14] = [
        BuffKind::XpBoost,
        BuffKind::Insurance,
        BuffKind::LuckyCharm,
        BuffKind::Critical,
        BuffKind::Stealth,
        BuffKind::Magnet,
        BuffKind::Oracle,
        BuffKind::Rewind,
        BuffKind::LoadedDice,
        BuffKind::StreakShield,
        BuffKind::Vampirism,
        BuffKind::Phoenix,
        BuffKind::Titan,
        BuffKind::FarSight,
    ];

    /// Solo win-chance override in basis points, if this buff sets one.
    ///
    /// Overrides never stack; the resolver takes the highest applicable.
    pub fn solo_chance_override_bp(self) -> Option<u32> {
        match self {
            BuffKind::LoadedDice => Some(6_000),
            BuffKind::Magnet => Some(9_000),
            BuffKind::Oracle => Some(10_000),
            _ => None,
        }
    }

    /// PvP host-chance shift in basis points. Added when the host holds the
    /// buff, subtracted when the guest does.
    pub fn pvp_chance_delta_bp(self) -> u32 {
        match self {
            BuffKind::LoadedDice => 1_000,
            BuffKind::Magnet => 3_000,
            BuffKind::Oracle => 4_500,
            _ => 0,
        }
    }
}

impl std::fmt::Display for BuffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuffKind::XpBoost => "xp_boost",
            BuffKind::Insurance => "insurance",
            BuffKind::LuckyCharm => "lucky_charm",
            BuffKind::Critical => "critical",
            BuffKind::Stealth => "stealth",
            BuffKind::Magnet => "magnet",
            BuffKind::Oracle => "oracle",
            BuffKind::Rewind => "rewind",
            BuffKind::LoadedDice => "loaded_dice",
            BuffKind::StreakShield => "streak_shield",
            BuffKind::Vampirism => "vampirism",
            BuffKind::Phoenix => "phoenix",
            BuffKind::Titan => "titan",
            BuffKind::FarSight => "far_sight",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// MULTIPLIER CONSTANTS
// =============================================================================

/// LuckyCharm win multiplier (2.8x).
pub const LUCKY_CHARM_MULTIPLIER_BP: u32 = 28_000;
/// Critical-hit multiplier (5.0x).
pub const CRITICAL_MULTIPLIER_BP: u32 = 50_000;
/// Chance the critical multiplier triggers when Critical is active.
pub const CRITICAL_CHANCE_BP: u32 = 1_000;
/// Chance Phoenix nullifies a loss.
pub const PHOENIX_CHANCE_BP: u32 = 3_300;
/// Insurance cuts the loss in half.
pub const INSURANCE_REFUND_BP: u32 = 5_000;
/// Vampirism flat bonus, as a fraction of the stake.
pub const VAMPIRISM_BONUS_BP: u32 = 1_000;

/// PvP-only multipliers (Titan replaces, Magnet/LoadedDice pay differently
/// than their solo chance role).
pub const TITAN_MULTIPLIER_BP: u32 = 35_000;
pub const PVP_MAGNET_MULTIPLIER_BP: u32 = 40_000;
pub const PVP_LOADED_DICE_MULTIPLIER_BP: u32 = 25_000;

// =============================================================================
// ACTIVE FLAGS
// =============================================================================

/// The per-player block of active buff flags, plus the one valued flag:
/// the coin side a flip hint predicted.
///
/// A fetched document may predate newer buffs, so every field defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveBuffs {
    pub xp_boost: bool,
    pub insurance: bool,
    pub lucky_charm: bool,
    pub critical: bool,
    pub stealth: bool,
    pub magnet: bool,
    pub oracle: bool,
    pub rewind: bool,
    pub loaded_dice: bool,
    pub streak_shield: bool,
    pub vampirism: bool,
    pub phoenix: bool,
    pub titan: bool,
    pub far_sight: bool,
    /// Side predicted by a consumed flip hint, if any.
    pub predicted_side: Option<CoinSide>,
}

impl ActiveBuffs {
    /// Whether the given kind is currently active.
    pub fn is_active(&self, kind: BuffKind) -> bool {
        match kind {
            BuffKind::XpBoost => self.xp_boost,
            BuffKind::Insurance => self.insurance,
            BuffKind::LuckyCharm => self.lucky_charm,
            BuffKind::Critical => self.critical,
            BuffKind::Stealth => self.stealth,
            BuffKind::Magnet => self.magnet,
            BuffKind::Oracle => self.oracle,
            BuffKind::Rewind => self.rewind,
            BuffKind::LoadedDice => self.loaded_dice,
            BuffKind::StreakShield => self.streak_shield,
            BuffKind::Vampirism => self.vampirism,
            BuffKind::Phoenix => self.phoenix,
            BuffKind::Titan => self.titan,
            BuffKind::FarSight => self.far_sight,
        }
    }

    /// Set or clear one flag.
    pub fn set(&mut self, kind: BuffKind, active: bool) {
        match kind {
            BuffKind::XpBoost => self.xp_boost = active,
            BuffKind::Insurance => self.insurance = active,
            BuffKind::LuckyCharm => self.lucky_charm = active,
            BuffKind::Critical => self.critical = active,
            BuffKind::Stealth => self.stealth = active,
            BuffKind::Magnet => self.magnet = active,
            BuffKind::Oracle => self.oracle = active,
            BuffKind::Rewind => self.rewind = active,
            BuffKind::LoadedDice => self.loaded_dice = active,
            BuffKind::StreakShield => self.streak_shield = active,
            BuffKind::Vampirism => self.vampirism = active,
            BuffKind::Phoenix => self.phoenix = active,
            BuffKind::Titan => self.titan = active,
            BuffKind::FarSight => self.far_sight = active,
        }
    }

    /// Force-clear every flag. Runs once after every resolved wager;
    /// a no-op when nothing was active.
    pub fn clear(&mut self) {
        *self = ActiveBuffs::default();
    }

    /// True if any flag (or the prediction) is set.
    pub fn any_active(&self) -> bool {
        self.predicted_side.is_some() || BuffKind::ALL.iter().any(|&k| self.is_active(k))
    }

    /// Kinds currently toggled on, in catalog order.
    pub fn active_kinds(&self) -> Vec<BuffKind> {
        BuffKind::ALL
            .iter()
            .copied()
            .filter(|&k| self.is_active(k))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
