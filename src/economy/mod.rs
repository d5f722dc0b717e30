//! Economy primitives: leveling curve, payout arithmetic, XP awards.
//!
//! All money math is integer-only. Fractional multipliers are expressed in
//! basis points (1/10_000) and applied with floor division so replays and
//! independent resolvers always agree to the last coin.

pub mod levels;
pub mod payout;
pub mod xp;

pub use levels::{level_for_lifetime_xp, xp_for_level, LEVEL_THRESHOLDS, MAX_LEVEL};
pub use payout::{
    apply_multiplier_bp, win_payout, BASE_WIN_MULTIPLIER_BP, INITIAL_BALANCE, MIN_BET,
};
pub use xp::{xp_for_outcome, XpAward, LOSS_XP, MAX_XP_PER_GAME, WIN_XP};

/// Hourly faucet: amount granted and the cooldown between claims.
pub const HOURLY_BONUS_AMOUNT: i64 = 100;
pub const HOURLY_BONUS_COOLDOWN_MS: i64 = 60 * 60 * 1000;

/// Coins granted per level gained on level-up (scaled by the new level).
pub const LEVEL_UP_REWARD_PER_LEVEL: i64 = 1_000;

/// Consecutive-day login rewards as (money, xp), indexed by day-in-streak
/// (day 1 first). The streak restarts after the final entry.
pub const DAILY_LOGIN_REWARDS: [(i64, u64); 7] = [
    (100, 50),
    (200, 100),
    (500, 150),
    (800, 200),
    (1_200, 300),
    (2_000, 400),
    (5_000, 1_000),
];
