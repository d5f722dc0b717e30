//! Client side of the room protocol.
//!
//! Every balance movement here follows the debit-then-write shape: the
//! stake leaves the local aggregate before the store is touched, and any
//! failure after that point compensates with a local refund before anything
//! else can queue against the balance. The store offers no transactions;
//! the join race is decided by a status precondition on the guest's single
//! write, and the losing guest never writes at all.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::rng::GameRng;
use crate::economy::payout::{apply_multiplier_bp, BASE_WIN_MULTIPLIER_BP};
use crate::economy::xp::{xp_for_outcome, MAX_XP_PER_GAME};
use crate::game::solo::{grant_quest_rewards, validate_stake, WagerError, BASE_WIN_CHANCE_BP};
use crate::game::CoinSide;
use crate::items::buffs::{
    BuffKind, CRITICAL_CHANCE_BP, CRITICAL_MULTIPLIER_BP, INSURANCE_REFUND_BP,
    LUCKY_CHARM_MULTIPLIER_BP, PHOENIX_CHANCE_BP, PVP_LOADED_DICE_MULTIPLIER_BP,
    PVP_MAGNET_MULTIPLIER_BP, TITAN_MULTIPLIER_BP, VAMPIRISM_BONUS_BP,
};
use crate::player::{GameKind, HistoryEntry, LevelUp, Player};
use crate::pvp::room::{i_won, ParticipantSnapshot, Room, RoomStatus};
use crate::quests::daily::{apply_event, QuestEvent, QuestKind};
use crate::store::{GameStore, RoomPatch, StoreError};

/// Render delay between FLIPPING and FINISHED. Purely cosmetic: the result
/// is already committed when FLIPPING is written.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Flat PvP win XP bonus on top of the solo win XP.
pub const PVP_WIN_BONUS_XP: u64 = 50;

/// Attempts at an unclaimed room code before giving up.
const CODE_ATTEMPTS: usize = 8;

/// Host chance clamp when no god mode is involved.
const MIN_HOST_CHANCE_BP: u32 = 500;
const MAX_HOST_CHANCE_BP: u32 = 9_500;

// =============================================================================
// ERRORS
// =============================================================================

/// PvP protocol failures. Any stake debited before the failure has been
/// refunded by the time these surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Stake rejected before any debit.
    #[error(transparent)]
    Wager(#[from] WagerError),

    /// The shared store is unreachable; PvP fails fast.
    #[error("store unavailable")]
    StoreUnavailable,

    /// Room gone, already claimed, or in the wrong state.
    #[error("room unavailable")]
    RoomUnavailable,

    /// Operation reserved for the host.
    #[error("not the host")]
    NotHost,

    /// Transition not legal from the room's current status.
    #[error("invalid room state")]
    InvalidState,
}

impl From<StoreError> for RoomError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable => RoomError::StoreUnavailable,
            StoreError::RoomNotFound | StoreError::Conflict => RoomError::RoomUnavailable,
        }
    }
}

// =============================================================================
// WIN CHANCE
// =============================================================================

/// Host win chance from both buff snapshots.
///
/// Symmetric counters: the host's chance buffs add their delta, the guest's
/// identical buffs subtract it. God mode on either side bypasses the
/// formula and the clamp entirely.
pub fn host_win_chance_bp(host: &ParticipantSnapshot, guest: Option<&ParticipantSnapshot>) -> u32 {
    if host.god_mode {
        return 10_000;
    }
    if guest.map(|g| g.god_mode).unwrap_or(false) {
        return 0;
    }

    let mut chance = BASE_WIN_CHANCE_BP as i32;
    for kind in BuffKind::ALL {
        let delta = kind.pvp_chance_delta_bp() as i32;
        if delta == 0 {
            continue;
        }
        if host.buffs.is_active(kind) {
            chance += delta;
        }
        if guest.map(|g| g.buffs.is_active(kind)).unwrap_or(false) {
            chance -= delta;
        }
    }
    chance.clamp(MIN_HOST_CHANCE_BP as i32, MAX_HOST_CHANCE_BP as i32) as u32
}

// =============================================================================
// SETTLEMENT
// =============================================================================

/// A PvP duel settled from this client's perspective.
#[derive(Debug, Clone)]
pub struct PvpSettlement {
    pub won: bool,
    /// Profit on a win, realized loss on a loss.
    pub amount: i64,
    pub critical: bool,
    pub opponent: String,
    pub xp: u64,
    pub completed_quests: Vec<QuestKind>,
    pub level_up: Option<LevelUp>,
}

/// Gross win payout for a PvP stake under a buff snapshot.
///
/// Overrides, never additive; the assignment order below is the effective
/// priority (critical roll beats titan beats loaded dice beats magnet beats
/// lucky charm). Vampirism is the one flat bonus applied on top.
fn pvp_win_payout(
    stake: i64,
    buffs: &crate::items::buffs::ActiveBuffs,
    rng: &mut GameRng,
) -> (i64, bool) {
    let mut multiplier_bp = BASE_WIN_MULTIPLIER_BP;
    if buffs.lucky_charm {
        multiplier_bp = LUCKY_CHARM_MULTIPLIER_BP;
    }
    if buffs.magnet {
        multiplier_bp = PVP_MAGNET_MULTIPLIER_BP;
    }
    if buffs.loaded_dice {
        multiplier_bp = PVP_LOADED_DICE_MULTIPLIER_BP;
    }
    if buffs.titan {
        multiplier_bp = TITAN_MULTIPLIER_BP;
    }
    let mut critical = false;
    if buffs.critical && rng.roll_bp(CRITICAL_CHANCE_BP) {
        multiplier_bp = CRITICAL_MULTIPLIER_BP;
        critical = true;
    }

    let mut payout = apply_multiplier_bp(stake, multiplier_bp);
    if buffs.vampirism {
        payout += apply_multiplier_bp(stake, VAMPIRISM_BONUS_BP);
    }
    (payout, critical)
}

// =============================================================================
// CLIENT
// =============================================================================

/// One player's handle on the room protocol.
///
/// Tracks which rooms this client already settled so duplicate FINISHED
/// deliveries from the subscription are harmless.
pub struct PvpClient {
    store: Arc<dyn GameStore>,
    settle_delay: Duration,
    resolved: HashSet<String>,
}

impl PvpClient {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            settle_delay: SETTLE_DELAY,
            resolved: HashSet::new(),
        }
    }

    /// Shorten the cosmetic delay (tests).
    pub fn with_settle_delay(store: Arc<dyn GameStore>, delay: Duration) -> Self {
        Self {
            settle_delay: delay,
            ..Self::new(store)
        }
    }

    /// Create a WAITING room. Debits the stake first; any store failure
    /// refunds before returning.
    pub async fn create_room(
        &self,
        player: &mut Player,
        stake: i64,
        now_ms: i64,
        rng: &mut GameRng,
    ) -> Result<Room, RoomError> {
        validate_stake(stake, player.balance)?;
        player.balance -= stake;

        let snapshot = ParticipantSnapshot::capture(player);
        for _ in 0..CODE_ATTEMPTS {
            let code = rng.room_code();
            let room = Room::open(code, snapshot.clone(), stake, now_ms);
            match self.store.create_room(room.clone()).await {
                Ok(_) => {
                    info!(room = %room.id, stake, "room opened");
                    return Ok(room);
                }
                // Code collision; roll another.
                Err(StoreError::Conflict) => continue,
                Err(err) => {
                    player.balance += stake;
                    return Err(err.into());
                }
            }
        }
        player.balance += stake;
        Err(RoomError::StoreUnavailable)
    }

    /// Host-only: delete a still-WAITING room and take the stake back.
    pub async fn cancel_room(&self, player: &mut Player, room: &Room) -> Result<(), RoomError> {
        if !room.is_host(&player.id) {
            return Err(RoomError::NotHost);
        }
        if room.status != RoomStatus::Waiting {
            return Err(RoomError::InvalidState);
        }
        self.store.delete_room(&room.id).await?;
        player.balance += room.bet_amount;
        info!(room = %room.id, "room cancelled, stake refunded");
        Ok(())
    }

    /// Join a WAITING room as guest.
    ///
    /// The stake is debited speculatively before the room is read. Losing
    /// the race (the room is gone, claimed, or the READY write conflicts)
    /// refunds locally and reports the room unavailable; the loser never
    /// writes to the room.
    pub async fn join_room(&self, player: &mut Player, lobby_room: &Room) -> Result<Room, RoomError> {
        let stake = lobby_room.bet_amount;
        if stake > player.balance {
            return Err(WagerError::InsufficientBalance {
                stake,
                balance: player.balance,
            }
            .into());
        }
        player.balance -= stake;

        let refund_and_fail = |player: &mut Player, err: RoomError| {
            // Compensation must land before any other balance op queues.
            player.balance += stake;
            Err(err)
        };

        let current = match self.store.read_room(&lobby_room.id).await {
            Ok(room) => room,
            Err(err) => return refund_and_fail(player, err.into()),
        };
        match current {
            Some(room) if room.status == RoomStatus::Waiting => room,
            _ => return refund_and_fail(player, RoomError::RoomUnavailable),
        };

        let snapshot = ParticipantSnapshot::capture(player);
        let patch = RoomPatch {
            expect_status: Some(RoomStatus::Waiting),
            status: Some(RoomStatus::Ready),
            guest: Some(snapshot.clone()),
            ..RoomPatch::default()
        };
        match self.store.write_room(&lobby_room.id, patch).await {
            Ok(()) => {}
            Err(err) => return refund_and_fail(player, err.into()),
        }

        debug!(room = %lobby_room.id, "joined as guest");
        let mut joined = lobby_room.clone();
        joined.guest = Some(snapshot);
        joined.status = RoomStatus::Ready;
        Ok(joined)
    }

    /// Host-only: commit to a side and draw the result.
    ///
    /// FLIPPING, the side, and the result land in one patch; FINISHED
    /// follows after the render delay via a background task and changes
    /// nothing about the outcome.
    pub async fn host_flip(
        &self,
        player: &Player,
        room: &Room,
        side: CoinSide,
        rng: &mut GameRng,
    ) -> Result<CoinSide, RoomError> {
        if !room.is_host(&player.id) {
            return Err(RoomError::NotHost);
        }
        if room.status != RoomStatus::Ready {
            return Err(RoomError::InvalidState);
        }

        let chance_bp = host_win_chance_bp(&room.host, room.guest.as_ref());
        let host_wins = rng.roll_bp(chance_bp);
        let result = if host_wins { side } else { side.opposite() };
        debug!(room = %room.id, chance_bp, host_wins, "pvp result drawn");

        self.store
            .write_room(
                &room.id,
                RoomPatch {
                    expect_status: Some(RoomStatus::Ready),
                    status: Some(RoomStatus::Flipping),
                    selected_side: Some(side),
                    result: Some(result),
                    ..RoomPatch::default()
                },
            )
            .await?;

        let store = Arc::clone(&self.store);
        let room_id = room.id.clone();
        let delay = self.settle_delay;
        tokio::spawn(async move {
            sleep(delay).await;
            let patch = RoomPatch {
                expect_status: Some(RoomStatus::Flipping),
                status: Some(RoomStatus::Finished),
                ..RoomPatch::default()
            };
            if let Err(err) = store.write_room(&room_id, patch).await {
                warn!(room = %room_id, %err, "failed to finish room");
            }
        });

        Ok(result)
    }

    /// Settle a FINISHED room from this client's perspective.
    ///
    /// Idempotent per room: duplicate deliveries return `Ok(None)` and
    /// touch nothing. Payout and mitigation use this side's buff snapshot
    /// frozen at create/join time, never the live flags.
    pub fn resolve_finished(
        &mut self,
        player: &mut Player,
        room: &Room,
        now_ms: i64,
        rng: &mut GameRng,
    ) -> Result<Option<PvpSettlement>, RoomError> {
        let (Some(result), Some(selected_side)) = (room.result, room.selected_side) else {
            return Err(RoomError::InvalidState);
        };
        if room.status != RoomStatus::Finished {
            return Err(RoomError::InvalidState);
        }
        if !self.resolved.insert(room.id.clone()) {
            return Ok(None);
        }

        let is_host = room.is_host(&player.id);
        let snapshot = room
            .snapshot_for(is_host)
            .cloned()
            .ok_or(RoomError::InvalidState)?;
        let buffs = snapshot.buffs;
        let won = i_won(result, selected_side, is_host);
        let stake = room.bet_amount;
        let opponent = match room.snapshot_for(!is_host) {
            Some(snap) => snap.name.clone(),
            None => REDACTED_OPPONENT.to_string(),
        };

        player.active_buffs.clear();

        let mut completed = Vec::new();
        let mut critical = false;
        let amount;
        let xp;

        if won {
            let (payout, crit) = pvp_win_payout(stake, &buffs, rng);
            critical = crit;
            player.balance += payout;
            player.record_win();
            amount = payout - stake;
            xp = xp_for_outcome(true, buffs.xp_boost, PVP_WIN_BONUS_XP).amount;

            player.push_history(HistoryEntry {
                id: room.id.clone(),
                kind: GameKind::Pvp,
                won: true,
                amount,
                timestamp_ms: now_ms,
                opponent: Some(opponent.clone()),
            });

            completed.extend(apply_event(&mut player.quests, QuestEvent::PvpWon));
            completed.extend(apply_event(&mut player.quests, QuestEvent::Won));
            completed.extend(apply_event(
                &mut player.quests,
                QuestEvent::StreakReached(player.stats.current_win_streak),
            ));
        } else {
            // The stake already left at create/join; mitigation refunds it.
            let mut loss = stake;
            if buffs.rewind {
                player.balance += stake;
                loss = 0;
            } else if buffs.phoenix && rng.roll_bp(PHOENIX_CHANCE_BP) {
                player.balance += stake;
                loss = 0;
            } else if buffs.insurance {
                let refund = apply_multiplier_bp(stake, INSURANCE_REFUND_BP);
                player.balance += refund;
                loss = stake - refund;
            }
            player.record_loss(buffs.streak_shield);
            amount = loss;

            let stake_bonus = if buffs.oracle { stake.max(0) as u64 } else { 0 };
            xp = xp_for_outcome(false, buffs.xp_boost, stake_bonus).amount;

            player.push_history(HistoryEntry {
                id: room.id.clone(),
                kind: GameKind::Pvp,
                won: false,
                amount: loss,
                timestamp_ms: now_ms,
                opponent: Some(opponent.clone()),
            });

            completed.extend(apply_event(&mut player.quests, QuestEvent::Lost));
        }

        let level_up = player.apply_xp(xp.min(MAX_XP_PER_GAME), rng);

        completed.extend(apply_event(&mut player.quests, QuestEvent::Played));
        completed.extend(apply_event(&mut player.quests, QuestEvent::PvpPlayed));
        grant_quest_rewards(player, &completed, rng);

        info!(room = %room.id, won, amount, "pvp duel settled");
        Ok(Some(PvpSettlement {
            won,
            amount,
            critical,
            opponent,
            xp,
            completed_quests: completed,
            level_up,
        }))
    }
}

const REDACTED_OPPONENT: &str = "Opponent";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::xp::WIN_XP;
    use crate::economy::INITIAL_BALANCE;
    use crate::store::MemoryStore;

    fn plateau_player(id: &str, name: &str) -> Player {
        let mut p = Player::new(id, name);
        p.lifetime_xp = 3_000;
        p.level = 5;
        p
    }

    fn setup() -> (Arc<MemoryStore>, GameRng) {
        (Arc::new(MemoryStore::new()), GameRng::new(0xDEAD))
    }

    fn client(store: &Arc<MemoryStore>) -> PvpClient {
        PvpClient::with_settle_delay(
            Arc::clone(store) as Arc<dyn GameStore>,
            Duration::from_millis(1),
        )
    }

    async fn wait_for_finished(store: &Arc<MemoryStore>, room_id: &str) -> Room {
        let mut rx = store.subscribe_room(room_id).await.unwrap();
        loop {
            if let Some(room) = rx.recv().await.unwrap() {
                if room.status == RoomStatus::Finished {
                    return room;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_create_debits_and_cancel_refunds() {
        let (store, mut rng) = setup();
        let pvp = client(&store);
        let mut host = plateau_player("h", "Host");

        let room = pvp.create_room(&mut host, 300, 0, &mut rng).await.unwrap();
        assert_eq!(host.balance, INITIAL_BALANCE - 300);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.id.len(), 4);

        pvp.cancel_room(&mut host, &room).await.unwrap();
        assert_eq!(host.balance, INITIAL_BALANCE);
        assert!(store.read_room(&room.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_stake_without_debit() {
        let (store, mut rng) = setup();
        let pvp = client(&store);
        let mut host = plateau_player("h", "Host");
        let err = pvp.create_room(&mut host, 5, 0, &mut rng).await.unwrap_err();
        assert!(matches!(err, RoomError::Wager(WagerError::StakeTooSmall { .. })));
        assert_eq!(host.balance, INITIAL_BALANCE);
    }

    #[tokio::test]
    async fn test_join_sets_ready_with_guest() {
        let (store, mut rng) = setup();
        let pvp = client(&store);
        let mut host = plateau_player("h", "Host");
        let mut guest = plateau_player("g", "Guest");

        let room = pvp.create_room(&mut host, 200, 0, &mut rng).await.unwrap();
        let joined = pvp.join_room(&mut guest, &room).await.unwrap();
        assert_eq!(guest.balance, INITIAL_BALANCE - 200);
        assert_eq!(joined.status, RoomStatus::Ready);
        assert_eq!(joined.guest.as_ref().unwrap().id, "g");

        let stored = store.read_room(&room.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RoomStatus::Ready);
    }

    #[tokio::test]
    async fn test_join_race_exactly_one_ready() {
        let (store, mut rng) = setup();
        let pvp_host = client(&store);
        let pvp_a = client(&store);
        let pvp_b = client(&store);
        let mut host = plateau_player("h", "Host");
        let mut a = plateau_player("a", "A");
        let mut b = plateau_player("b", "B");

        let room = pvp_host
            .create_room(&mut host, 250, 0, &mut rng)
            .await
            .unwrap();

        let (res_a, res_b) =
            tokio::join!(pvp_a.join_room(&mut a, &room), pvp_b.join_room(&mut b, &room));

        // Exactly one join lands.
        assert_ne!(res_a.is_ok(), res_b.is_ok());
        let stored = store.read_room(&room.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RoomStatus::Ready);
        assert!(stored.guest.is_some());

        // The loser was refunded in full, the winner stays debited, and the
        // room holds exactly the winner's snapshot.
        let (winner, loser, winner_id) = if res_a.is_ok() {
            (&a, &b, "a")
        } else {
            (&b, &a, "b")
        };
        assert_eq!(loser.balance, INITIAL_BALANCE);
        assert_eq!(winner.balance, INITIAL_BALANCE - 250);
        assert_eq!(stored.guest.unwrap().id, winner_id);
        if let Err(err) = if res_a.is_ok() { res_b } else { res_a } {
            assert_eq!(err, RoomError::RoomUnavailable);
        }
    }

    #[tokio::test]
    async fn test_join_lost_room_refunds() {
        let (store, mut rng) = setup();
        let pvp = client(&store);
        let mut host = plateau_player("h", "Host");
        let mut guest = plateau_player("g", "Guest");

        let room = pvp.create_room(&mut host, 100, 0, &mut rng).await.unwrap();
        pvp.cancel_room(&mut host, &room).await.unwrap();

        let err = pvp.join_room(&mut guest, &room).await.unwrap_err();
        assert_eq!(err, RoomError::RoomUnavailable);
        assert_eq!(guest.balance, INITIAL_BALANCE);
    }

    #[tokio::test]
    async fn test_host_flip_commits_result_then_finishes() {
        let (store, mut rng) = setup();
        let pvp = client(&store);
        let mut host = plateau_player("h", "Host");
        let mut guest = plateau_player("g", "Guest");

        let room = pvp.create_room(&mut host, 100, 0, &mut rng).await.unwrap();
        let joined = pvp.join_room(&mut guest, &room).await.unwrap();

        let result = pvp
            .host_flip(&host, &joined, CoinSide::Heads, &mut rng)
            .await
            .unwrap();

        let flipping = store.read_room(&room.id).await.unwrap().unwrap();
        assert_eq!(flipping.selected_side, Some(CoinSide::Heads));
        assert_eq!(flipping.result, Some(result));

        let finished = wait_for_finished(&store, &room.id).await;
        // The second update only moves the status.
        assert_eq!(finished.result, Some(result));
        assert_eq!(finished.selected_side, Some(CoinSide::Heads));
    }

    #[tokio::test]
    async fn test_guest_cannot_flip_and_waiting_cannot_flip() {
        let (store, mut rng) = setup();
        let pvp = client(&store);
        let mut host = plateau_player("h", "Host");
        let guest = plateau_player("g", "Guest");

        let room = pvp.create_room(&mut host, 100, 0, &mut rng).await.unwrap();
        assert_eq!(
            pvp.host_flip(&guest, &room, CoinSide::Heads, &mut rng)
                .await
                .unwrap_err(),
            RoomError::NotHost
        );
        assert_eq!(
            pvp.host_flip(&host, &room, CoinSide::Heads, &mut rng)
                .await
                .unwrap_err(),
            RoomError::InvalidState
        );
    }

    #[tokio::test]
    async fn test_full_duel_settles_both_sides() {
        let (store, mut rng) = setup();
        let mut pvp_host = client(&store);
        let mut pvp_guest = client(&store);
        let mut host = plateau_player("h", "Hana");
        let mut guest = plateau_player("g", "Gene");

        let room = pvp_host
            .create_room(&mut host, 100, 0, &mut rng)
            .await
            .unwrap();
        pvp_guest.join_room(&mut guest, &room).await.unwrap();
        pvp_host
            .host_flip(
                &host,
                &store.read_room(&room.id).await.unwrap().unwrap(),
                CoinSide::Heads,
                &mut rng,
            )
            .await
            .unwrap();

        let finished = wait_for_finished(&store, &room.id).await;
        let hs = pvp_host
            .resolve_finished(&mut host, &finished, 1, &mut rng)
            .unwrap()
            .unwrap();
        let gs = pvp_guest
            .resolve_finished(&mut guest, &finished, 1, &mut rng)
            .unwrap()
            .unwrap();

        assert_ne!(hs.won, gs.won);
        let (winner, ws) = if hs.won { (&host, &hs) } else { (&guest, &gs) };
        let loser = if hs.won { &guest } else { &host };

        // Winner: stake already debited, credited floor(100 * 1.9) = 190.
        assert_eq!(winner.balance, INITIAL_BALANCE - 100 + 190);
        assert_eq!(ws.amount, 90);
        assert_eq!(ws.xp, WIN_XP + PVP_WIN_BONUS_XP);
        // Loser: full stake gone.
        assert_eq!(loser.balance, INITIAL_BALANCE - 100);

        assert_eq!(winner.history[0].kind, GameKind::Pvp);
        assert!(winner.history[0].won);
        assert_eq!(winner.history[0].opponent.as_deref(), Some(if hs.won { "Gene" } else { "Hana" }));
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let (store, mut rng) = setup();
        let mut pvp_host = client(&store);
        let mut host = plateau_player("h", "Host");
        let mut guest = plateau_player("g", "Guest");

        let room = pvp_host
            .create_room(&mut host, 100, 0, &mut rng)
            .await
            .unwrap();
        client(&store).join_room(&mut guest, &room).await.unwrap();
        pvp_host
            .host_flip(
                &host,
                &store.read_room(&room.id).await.unwrap().unwrap(),
                CoinSide::Tails,
                &mut rng,
            )
            .await
            .unwrap();
        let finished = wait_for_finished(&store, &room.id).await;

        assert!(pvp_host
            .resolve_finished(&mut host, &finished, 1, &mut rng)
            .unwrap()
            .is_some());
        let snapshot = host.clone();
        // Duplicate delivery from the subscription: no effect at all.
        assert!(pvp_host
            .resolve_finished(&mut host, &finished, 2, &mut rng)
            .unwrap()
            .is_none());
        assert_eq!(host, snapshot);
    }

    #[tokio::test]
    async fn test_loss_mitigation_uses_snapshot_not_live_buffs() {
        let (store, mut rng) = setup();
        let mut pvp_guest = client(&store);
        let pvp_host = client(&store);
        let mut host = plateau_player("h", "Host");
        host.god_mode = true; // guest is guaranteed to lose
        let mut guest = plateau_player("g", "Guest");
        guest.active_buffs.rewind = true;

        let room = pvp_host
            .create_room(&mut host, 200, 0, &mut rng)
            .await
            .unwrap();
        pvp_guest.join_room(&mut guest, &room).await.unwrap();
        // Guest toggles the buff off after joining; the snapshot still
        // carries it.
        guest.active_buffs.rewind = false;

        pvp_host
            .host_flip(
                &host,
                &store.read_room(&room.id).await.unwrap().unwrap(),
                CoinSide::Heads,
                &mut rng,
            )
            .await
            .unwrap();
        let finished = wait_for_finished(&store, &room.id).await;
        let gs = pvp_guest
            .resolve_finished(&mut guest, &finished, 1, &mut rng)
            .unwrap()
            .unwrap();

        assert!(!gs.won);
        assert_eq!(gs.amount, 0);
        assert_eq!(guest.balance, INITIAL_BALANCE);
    }

    #[test]
    fn test_host_chance_formula() {
        let mut host = ParticipantSnapshot::default();
        let mut guest = ParticipantSnapshot::default();
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 5_000);

        host.buffs.magnet = true; // +3000
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 8_000);

        guest.buffs.magnet = true; // symmetric counter
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 5_000);

        host.buffs.oracle = true; // +4500, clamped
        host.buffs.loaded_dice = true; // +1000
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 9_500);

        guest.buffs.oracle = true;
        guest.buffs.loaded_dice = true;
        host.buffs = Default::default();
        host.buffs.magnet = true;
        // 5000 + 3000 - 3000 - 4500 - 1000 clamps at the floor.
        guest.buffs.magnet = true;
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 500);
    }

    #[test]
    fn test_god_mode_overrides_formula() {
        let mut host = ParticipantSnapshot::default();
        let mut guest = ParticipantSnapshot::default();
        guest.buffs.oracle = true;
        host.god_mode = true;
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 10_000);

        host.god_mode = false;
        guest.god_mode = true;
        assert_eq!(host_win_chance_bp(&host, Some(&guest)), 0);
    }

    #[test]
    fn test_pvp_payout_priority() {
        let mut rng = GameRng::new(5);
        let mut buffs = crate::items::buffs::ActiveBuffs::default();
        assert_eq!(pvp_win_payout(100, &buffs, &mut rng).0, 190);

        buffs.lucky_charm = true;
        assert_eq!(pvp_win_payout(100, &buffs, &mut rng).0, 280);
        buffs.magnet = true;
        assert_eq!(pvp_win_payout(100, &buffs, &mut rng).0, 400);
        buffs.loaded_dice = true;
        assert_eq!(pvp_win_payout(100, &buffs, &mut rng).0, 250);
        buffs.titan = true;
        assert_eq!(pvp_win_payout(100, &buffs, &mut rng).0, 350);

        // Vampirism stacks flat on any multiplier.
        buffs.vampirism = true;
        assert_eq!(pvp_win_payout(100, &buffs, &mut rng).0, 360);
    }
}
