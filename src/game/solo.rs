//! Solo wager resolver.
//!
//! Split in two halves: `flip` validates the stake and draws the outcome,
//! `settle` is the deterministic `(player, outcome) -> player'` step that
//! applies payout, mitigation, XP, quests, and the buff clear. Keeping the
//! draw out of `settle` lets forced-outcome scenarios run without touching
//! the RNG distribution.

use tracing::debug;

use crate::core::rng::GameRng;
use crate::economy::payout::{
    apply_multiplier_bp, win_payout, BASE_WIN_MULTIPLIER_BP, MIN_BET,
};
use crate::economy::xp::{xp_for_outcome, MAX_XP_PER_GAME};
use crate::game::CoinSide;
use crate::items::buffs::{
    ActiveBuffs, CRITICAL_CHANCE_BP, CRITICAL_MULTIPLIER_BP, INSURANCE_REFUND_BP,
    LUCKY_CHARM_MULTIPLIER_BP, PHOENIX_CHANCE_BP,
};
use crate::player::{GameKind, HistoryEntry, LevelUp, Player};
use crate::quests::daily::{apply_event, QuestEvent, QuestKind};

/// Base win chance with no modifiers: a fair coin.
pub const BASE_WIN_CHANCE_BP: u32 = 5_000;

// =============================================================================
// ERRORS
// =============================================================================

/// Stake rejection. No state changes on any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WagerError {
    /// Stake below the table minimum.
    #[error("minimum stake is {min}")]
    StakeTooSmall { min: i64 },

    /// Stake exceeds the balance.
    #[error("insufficient balance: stake {stake}, balance {balance}")]
    InsufficientBalance { stake: i64, balance: i64 },
}

// =============================================================================
// OUTCOME
// =============================================================================

/// A settled solo wager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoloOutcome {
    pub won: bool,
    pub result: CoinSide,
    /// Profit on a win, realized (post-mitigation) loss on a loss.
    pub amount: i64,
    /// The 10% critical multiplier triggered.
    pub critical: bool,
    /// A loss was nullified by rewind or phoenix.
    pub loss_nullified: bool,
    /// XP credited for the game.
    pub xp: u64,
}

/// Everything a settlement changed beyond the player itself.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub outcome: SoloOutcome,
    pub completed_quests: Vec<QuestKind>,
    pub level_up: Option<LevelUp>,
}

// =============================================================================
// DRAW
// =============================================================================

/// Stake bounds check. Rejects without touching the player.
pub fn validate_stake(stake: i64, balance: i64) -> Result<(), WagerError> {
    if stake < MIN_BET {
        return Err(WagerError::StakeTooSmall { min: MIN_BET });
    }
    if stake > balance {
        return Err(WagerError::InsufficientBalance { stake, balance });
    }
    Ok(())
}

/// Effective win chance. Overrides never stack; the highest applicable
/// value wins, and god mode beats everything.
pub fn effective_win_chance_bp(god_mode: bool, buffs: &ActiveBuffs) -> u32 {
    if god_mode {
        return 10_000;
    }
    buffs
        .active_kinds()
        .iter()
        .filter_map(|k| k.solo_chance_override_bp())
        .max()
        .unwrap_or(BASE_WIN_CHANCE_BP)
}

/// Validate and draw. The realized side equals the chosen side on a win,
/// its opposite on a loss.
pub fn flip(
    player: &Player,
    stake: i64,
    side: CoinSide,
    rng: &mut GameRng,
) -> Result<(bool, CoinSide), WagerError> {
    validate_stake(stake, player.balance)?;
    let chance_bp = effective_win_chance_bp(player.god_mode, &player.active_buffs);
    let won = rng.roll_bp(chance_bp);
    let result = if won { side } else { side.opposite() };
    debug!(stake, chance_bp, won, %result, "solo flip drawn");
    Ok((won, result))
}

// =============================================================================
// SETTLE
// =============================================================================

/// Apply a drawn outcome to the player.
///
/// Consumes (clears) the active buff block, credits or debits the balance,
/// updates stats and history, feeds quest progress, and awards XP. The
/// caller is responsible for the achievement scan and persistence.
pub fn settle(
    player: &mut Player,
    stake: i64,
    result: CoinSide,
    won: bool,
    now_ms: i64,
    rng: &mut GameRng,
) -> Settlement {
    let buffs = player.active_buffs.clone();
    player.active_buffs.clear();

    let mut completed = Vec::new();
    let mut critical = false;
    let mut loss_nullified = false;
    let amount;
    let xp;

    if won {
        let mut multiplier_bp = BASE_WIN_MULTIPLIER_BP;
        if buffs.lucky_charm {
            multiplier_bp = LUCKY_CHARM_MULTIPLIER_BP;
        }
        if buffs.critical && rng.roll_bp(CRITICAL_CHANCE_BP) {
            multiplier_bp = CRITICAL_MULTIPLIER_BP;
            critical = true;
        }

        let profit = win_payout(stake, multiplier_bp) - stake;
        player.balance += profit;
        player.record_win();
        amount = profit;
        xp = xp_for_outcome(true, buffs.xp_boost, 0).amount;

        player.push_history(HistoryEntry {
            id: now_ms.to_string(),
            kind: GameKind::Solo,
            won: true,
            amount: profit,
            timestamp_ms: now_ms,
            opponent: None,
        });

        completed.extend(apply_event(&mut player.quests, QuestEvent::Won));
        completed.extend(apply_event(
            &mut player.quests,
            QuestEvent::StreakReached(player.stats.current_win_streak),
        ));
    } else {
        let mut loss = stake;
        if buffs.rewind {
            loss = 0;
            loss_nullified = true;
        } else if buffs.phoenix && rng.roll_bp(PHOENIX_CHANCE_BP) {
            loss = 0;
            loss_nullified = true;
        } else if buffs.insurance {
            loss = apply_multiplier_bp(stake, INSURANCE_REFUND_BP);
        }

        player.balance -= loss;
        player.record_loss(buffs.streak_shield);
        amount = loss;

        // Oracle consoles a loss with the full stake, inside the cap.
        let stake_bonus = if buffs.oracle { stake.max(0) as u64 } else { 0 };
        xp = xp_for_outcome(false, buffs.xp_boost, stake_bonus).amount;

        player.push_history(HistoryEntry {
            id: now_ms.to_string(),
            kind: GameKind::Solo,
            won: false,
            amount: loss,
            timestamp_ms: now_ms,
            opponent: None,
        });

        completed.extend(apply_event(&mut player.quests, QuestEvent::Lost));
    }

    player.stats.total_games += 1;
    player.stats.max_bet = player.stats.max_bet.max(stake);

    let level_up = player.apply_xp(xp.min(MAX_XP_PER_GAME), rng);

    completed.extend(apply_event(&mut player.quests, QuestEvent::Played));
    completed.extend(apply_event(&mut player.quests, QuestEvent::BetPlaced(stake)));

    grant_quest_rewards(player, &completed, rng);

    Settlement {
        outcome: SoloOutcome {
            won,
            result,
            amount,
            critical,
            loss_nullified,
            xp,
        },
        completed_quests: completed,
        level_up,
    }
}

/// Grant money + XP for each newly completed quest.
pub(crate) fn grant_quest_rewards(player: &mut Player, completed: &[QuestKind], rng: &mut GameRng) {
    for &kind in completed {
        let (_, money, xp, _) = kind.template();
        player.balance += money;
        player.apply_xp(xp, rng);
    }
}

/// Draw and settle in one step.
pub fn resolve(
    player: &mut Player,
    stake: i64,
    side: CoinSide,
    now_ms: i64,
    rng: &mut GameRng,
) -> Result<Settlement, WagerError> {
    let (won, result) = flip(player, stake, side, rng)?;
    Ok(settle(player, stake, result, won, now_ms, rng))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::INITIAL_BALANCE;
    use crate::quests::daily::Quest;

    // Parked mid-level so routine XP awards do not cross a threshold and
    // pollute balance assertions with level-up rewards.
    fn player() -> Player {
        let mut p = Player::new("p1", "Ada");
        p.lifetime_xp = 3_000;
        p.level = 5;
        p
    }

    fn rng() -> GameRng {
        GameRng::new(42)
    }

    #[test]
    fn test_stake_validation_rejects_without_mutation() {
        let mut p = player();
        let before = p.clone();
        assert_eq!(
            resolve(&mut p, 5, CoinSide::Heads, 0, &mut rng()).unwrap_err(),
            WagerError::StakeTooSmall { min: MIN_BET }
        );
        assert_eq!(
            resolve(&mut p, 2_000, CoinSide::Heads, 0, &mut rng()).unwrap_err(),
            WagerError::InsufficientBalance {
                stake: 2_000,
                balance: INITIAL_BALANCE
            }
        );
        assert_eq!(p, before);
    }

    #[test]
    fn test_forced_win_pays_base_multiplier() {
        // balance=1000, stake=100, no buffs, forced win:
        // 1000 + floor(100 * 1.9) - 100 = 1090
        let mut p = player();
        let s = settle(&mut p, 100, CoinSide::Heads, true, 0, &mut rng());
        assert_eq!(p.balance, 1_090);
        assert_eq!(s.outcome.amount, 90);
        assert!(s.outcome.won);
        assert_eq!(p.stats.total_wins, 1);
        assert_eq!(p.stats.current_win_streak, 1);
        assert_eq!(p.history.len(), 1);
    }

    #[test]
    fn test_forced_loss_takes_full_stake() {
        let mut p = player();
        let s = settle(&mut p, 200, CoinSide::Tails, false, 0, &mut rng());
        assert_eq!(p.balance, 800);
        assert_eq!(s.outcome.amount, 200);
        assert_eq!(p.stats.current_win_streak, 0);
    }

    #[test]
    fn test_rewind_nullifies_loss_and_clears() {
        // balance=1000, stake=200, rewind active, forced loss: balance stays.
        let mut p = player();
        p.active_buffs.rewind = true;
        let s = settle(&mut p, 200, CoinSide::Heads, false, 0, &mut rng());
        assert_eq!(p.balance, 1_000);
        assert!(s.outcome.loss_nullified);
        assert!(!p.active_buffs.any_active());
    }

    #[test]
    fn test_insurance_halves_loss_floored() {
        let mut p = player();
        p.active_buffs.insurance = true;
        let s = settle(&mut p, 25, CoinSide::Heads, false, 0, &mut rng());
        // floor(25 / 2) = 12
        assert_eq!(s.outcome.amount, 12);
        assert_eq!(p.balance, 1_000 - 12);
    }

    #[test]
    fn test_lucky_charm_multiplier() {
        let mut p = player();
        p.active_buffs.lucky_charm = true;
        settle(&mut p, 100, CoinSide::Heads, true, 0, &mut rng());
        // floor(100 * 2.8) - 100 = 180
        assert_eq!(p.balance, 1_180);
    }

    #[test]
    fn test_streak_shield_keeps_streak() {
        let mut p = player();
        p.stats.current_win_streak = 4;
        p.active_buffs.streak_shield = true;
        settle(&mut p, 50, CoinSide::Heads, false, 0, &mut rng());
        assert_eq!(p.stats.current_win_streak, 4);
    }

    #[test]
    fn test_oracle_consolation_xp_on_loss() {
        let mut p = player();
        p.active_buffs.oracle = true;
        let s = settle(&mut p, 400, CoinSide::Heads, false, 0, &mut rng());
        assert_eq!(s.outcome.xp, 50 + 400);
    }

    #[test]
    fn test_buffs_cleared_after_any_resolution() {
        for forced_win in [true, false] {
            let mut p = player();
            p.active_buffs.magnet = true;
            p.active_buffs.critical = true;
            p.active_buffs.vampirism = true;
            p.active_buffs.predicted_side = Some(CoinSide::Tails);
            settle(&mut p, 50, CoinSide::Heads, forced_win, 0, &mut rng());
            assert!(!p.active_buffs.any_active(), "forced_win={forced_win}");
        }
    }

    #[test]
    fn test_chance_overrides() {
        let buffs = ActiveBuffs::default();
        assert_eq!(effective_win_chance_bp(false, &buffs), 5_000);
        assert_eq!(effective_win_chance_bp(true, &buffs), 10_000);

        let mut buffs = ActiveBuffs::default();
        buffs.loaded_dice = true;
        assert_eq!(effective_win_chance_bp(false, &buffs), 6_000);
        // Highest override wins; never additive.
        buffs.magnet = true;
        assert_eq!(effective_win_chance_bp(false, &buffs), 9_000);
        buffs.oracle = true;
        assert_eq!(effective_win_chance_bp(false, &buffs), 10_000);
    }

    #[test]
    fn test_base_chance_within_tolerance() {
        // Fair coin over 100k trials lands within 0.5 +/- 0.02.
        let mut p = player();
        p.balance = i64::MAX / 2;
        let mut r = GameRng::new(0xC01Fu64 ^ 0xFACADE);
        let mut wins = 0u32;
        let trials = 100_000;
        for _ in 0..trials {
            let (won, _) = flip(&p, MIN_BET, CoinSide::Heads, &mut r).unwrap();
            if won {
                wins += 1;
            }
        }
        let rate = wins as f64 / trials as f64;
        assert!((0.48..=0.52).contains(&rate), "win rate {rate}");
    }

    #[test]
    fn test_oracle_certainty() {
        let mut r = GameRng::new(99);
        for _ in 0..100 {
            let mut p = player();
            p.active_buffs.oracle = true;
            let s = resolve(&mut p, 50, CoinSide::Tails, 0, &mut r).unwrap();
            assert!(s.outcome.won);
            assert_eq!(s.outcome.result, CoinSide::Tails);
        }
    }

    #[test]
    fn test_loss_result_is_opposite_side() {
        let p = player();
        let mut r = GameRng::new(1);
        loop {
            let (won, result) = flip(&p, 50, CoinSide::Heads, &mut r).unwrap();
            if !won {
                assert_eq!(result, CoinSide::Tails);
                break;
            }
        }
    }

    #[test]
    fn test_win_quest_completes_on_third_win() {
        let mut p = player();
        p.quests = vec![Quest::new(QuestKind::WinCount)];
        let mut r = rng();
        let s1 = settle(&mut p, 50, CoinSide::Heads, true, 0, &mut r);
        let s2 = settle(&mut p, 50, CoinSide::Heads, true, 1, &mut r);
        assert!(s1.completed_quests.is_empty());
        assert!(s2.completed_quests.is_empty());
        let balance_before = p.balance;
        let s3 = settle(&mut p, 50, CoinSide::Heads, true, 2, &mut r);
        assert_eq!(s3.completed_quests, vec![QuestKind::WinCount]);
        // Quest reward money (150) on top of the wager profit (45).
        assert_eq!(p.balance, balance_before + 45 + 150);
        // Frozen: a fourth win grants nothing more.
        let s4 = settle(&mut p, 50, CoinSide::Heads, true, 3, &mut r);
        assert!(s4.completed_quests.is_empty());
    }

    #[test]
    fn test_level_up_reward_fires_at_threshold() {
        // 100 lifetime XP crosses the level-2 threshold; reward = 2 * 1000.
        let mut p = Player::new("p1", "Ada");
        let balance_before = p.balance;
        let up = p.apply_xp(100, &mut rng()).unwrap();
        assert_eq!(up.new_level, 2);
        assert_eq!(up.reward_money, 2_000);
        assert_eq!(p.balance, balance_before + 2_000);
    }
}
