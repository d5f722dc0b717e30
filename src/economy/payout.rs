//! Payout arithmetic.
//!
//! Multipliers are basis-point integers applied with floor division:
//! `payout = stake * multiplier_bp / 10_000`. Two resolvers settling the
//! same wager can never disagree by a rounding mode.

use crate::core::rng::BP_SCALE;

/// Base win multiplier: 1.9x, expressed in basis points.
pub const BASE_WIN_MULTIPLIER_BP: u32 = 19_000;

/// Smallest stake the tables accept.
pub const MIN_BET: i64 = 10;

/// Balance granted to a freshly created player.
pub const INITIAL_BALANCE: i64 = 1_000;

/// Apply a basis-point multiplier to an amount, flooring toward zero.
///
/// The accumulator is widened to i128 so even absurd balances cannot
/// overflow mid-multiply.
pub fn apply_multiplier_bp(amount: i64, multiplier_bp: u32) -> i64 {
    let wide = amount as i128 * multiplier_bp as i128 / BP_SCALE as i128;
    wide as i64
}

/// Gross payout for a winning stake at the given multiplier. The stake was
/// already debited when the wager was placed, so this is the full credit.
pub fn win_payout(stake: i64, multiplier_bp: u32) -> i64 {
    apply_multiplier_bp(stake, multiplier_bp)
}

// ============================================================================
// TESTS
// ============================================================================
