//! XP awards for wager outcomes.

/// XP for a won flip.
pub const WIN_XP: u64 = 150;

/// XP for a lost flip.
pub const LOSS_XP: u64 = 50;

/// Hard ceiling on XP credited from a single game, no matter what buffs
/// or stake-scaled bonuses stack up.
pub const MAX_XP_PER_GAME: u64 = 50_000;

/// An XP grant produced by a resolved game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpAward {
    pub amount: u64,
}

impl XpAward {
    pub fn new(amount: u64) -> Self {
        Self {
            amount: amount.min(MAX_XP_PER_GAME),
        }
    }
}

/// Base XP for an outcome, before buff adjustments.
///
/// `xp_boosted` doubles the award; `stake_bonus` (oracle consolation on a
/// loss) is added before the doubling so the boost applies to the whole
/// grant. The per-game cap is enforced last.
pub fn xp_for_outcome(won: bool, xp_boosted: bool, stake_bonus: u64) -> XpAward {
    let base = if won { WIN_XP } else { LOSS_XP };
    let mut amount = base + stake_bonus;
    if xp_boosted {
        amount *= 2;
    }
    XpAward::new(amount)
}

// ============================================================================
// TESTS
// ============================================================================
