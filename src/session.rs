//! Player Session
//!
//! The single logical actor that owns one `Player` aggregate. Every economy
//! operation runs to completion here before the next begins; the shared
//! store is only ever touched through the room protocol and best-effort
//! document writes. Solo play survives a missing store; PvP does not.

use std::sync::Arc;

use chrono::{Datelike, TimeZone, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::rng::GameRng;
use crate::economy::{DAILY_LOGIN_REWARDS, HOURLY_BONUS_AMOUNT, HOURLY_BONUS_COOLDOWN_MS};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::solo::{self, SoloOutcome, WagerError};
use crate::game::CoinSide;
use crate::items::shop::{
    catalog_entry, ItemId, ShopError, SkinId, GAMBLE_BOX_GAIN_XP, GAMBLE_BOX_LOSS_XP,
};
use crate::player::Player;
use crate::pvp::protocol::{PvpClient, PvpSettlement, RoomError};
use crate::pvp::room::{Room, RoomStatus};
use crate::quests::achievements;
use crate::quests::daily::{self, QuestKind};
use crate::store::{ChatMessage, GameStore, PublicLogEntry, StoreError};

// =============================================================================
// ERRORS
// =============================================================================

/// Session-level rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Hourly bonus claimed too soon.
    #[error("bonus on cooldown for {remaining_ms} ms")]
    BonusCooldown { remaining_ms: i64 },

    /// No daily login reward is pending.
    #[error("no login bonus pending")]
    NoLoginBonus,
}

/// Privileged operation rejections.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// Caller is not on the allow-list. No state changed.
    #[error("not authorized")]
    NotAuthorized,

    /// The owner identity cannot be revoked.
    #[error("owner cannot be revoked")]
    OwnerImmutable,

    /// Privilege checks need the store.
    #[error("store unavailable")]
    StoreUnavailable,
}

impl From<StoreError> for AdminError {
    fn from(_: StoreError) -> Self {
        AdminError::StoreUnavailable
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One player's controller.
pub struct Session {
    player: Player,
    store: Option<Arc<dyn GameStore>>,
    pvp: Option<PvpClient>,
    rng: GameRng,
    pending_events: Vec<GameEvent>,
    /// Daily reward computed at login, consumed by the claim.
    pending_login: Option<(u32, i64, u64)>,
    /// Allow-list identity that can never lose admin.
    owner_id: Option<String>,
}

impl Session {
    /// Start a session.
    ///
    /// Absent identity falls back to an ephemeral anonymous one; absent
    /// store degrades to local-only play. Loads (or creates) the player,
    /// rotates stale quests, and arms the daily login bonus.
    pub async fn start(
        identity: Option<(String, String)>,
        store: Option<Arc<dyn GameStore>>,
        now_ms: i64,
    ) -> Self {
        let (id, name) = identity.unwrap_or_else(|| {
            let id = Uuid::new_v4().to_string();
            (id, "Anonymous".to_string())
        });

        let mut rng = GameRng::from_session_params(&id, now_ms);

        let mut player = match &store {
            Some(store) => match store.get_player(&id).await {
                Ok(Some(existing)) => existing,
                Ok(None) => Player::new(id.clone(), name.clone()),
                Err(err) => {
                    warn!(%err, "player load failed, starting local-only state");
                    Player::new(id.clone(), name.clone())
                }
            },
            None => Player::new(id.clone(), name.clone()),
        };
        // Identity fields win over whatever the document carried.
        player.id = id;
        player.name = name;

        if player.quests.is_empty() || daily::batch_expired(player.quests_issued_at_ms, now_ms) {
            player.quests = daily::draw_batch(&mut rng);
            player.quests_issued_at_ms = now_ms;
            info!(count = player.quests.len(), "quest batch rotated");
        }

        let pvp = store.as_ref().map(|s| PvpClient::new(Arc::clone(s)));
        let mut session = Self {
            player,
            store,
            pvp,
            rng,
            pending_events: Vec::new(),
            pending_login: None,
            owner_id: None,
        };
        session.check_daily_login(now_ms);
        session.persist().await;
        session
    }

    /// Designate the identity whose admin grant is permanent.
    pub fn set_owner(&mut self, owner_id: impl Into<String>) {
        self.owner_id = Some(owner_id.into());
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Drain queued UI events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn push_event(&mut self, data: GameEventData) {
        self.pending_events.push(GameEvent::now(data));
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Best-effort document write. Store failures degrade to local play.
    async fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(err) = store.put_player(&self.player).await {
                warn!(%err, "player persist failed, continuing locally");
            }
        }
    }

    async fn append_log(&self, entry: PublicLogEntry) {
        if let Some(store) = &self.store {
            if let Err(err) = store.append_public_log(entry).await {
                warn!(%err, "public log append failed");
            }
        }
    }

    /// Queue quest completion events and run the achievement scan.
    fn after_action(&mut self, completed_quests: &[QuestKind]) {
        for &kind in completed_quests {
            let (_, money, xp, _) = kind.template();
            self.push_event(GameEventData::QuestCompleted {
                kind,
                reward_money: money,
                reward_xp: xp,
            });
        }
        let unlocked = achievements::evaluate(&mut self.player, &mut self.rng);
        for id in unlocked {
            let def = achievements::achievement_def(id);
            self.push_event(GameEventData::AchievementUnlocked {
                id,
                reward_money: def.reward_money,
                reward_xp: def.reward_xp,
            });
        }
    }

    // -------------------------------------------------------------------------
    // SOLO PLAY
    // -------------------------------------------------------------------------

    /// Place and resolve a solo wager.
    pub async fn solo_flip(
        &mut self,
        stake: i64,
        side: CoinSide,
    ) -> Result<SoloOutcome, WagerError> {
        let now_ms = Self::now_ms();
        let stealth = self.player.active_buffs.stealth;
        let settlement = solo::resolve(&mut self.player, stake, side, now_ms, &mut self.rng)?;

        if let Some(up) = &settlement.level_up {
            self.push_event(GameEventData::LevelUp {
                new_level: up.new_level,
                reward_money: up.reward_money,
                bonus_item: up.bonus_item,
            });
        }
        self.push_event(GameEventData::WagerResolved {
            won: settlement.outcome.won,
            amount: settlement.outcome.amount,
            result: settlement.outcome.result,
        });
        self.after_action(&settlement.completed_quests.clone());

        self.append_log(PublicLogEntry {
            player_id: self.player.id.clone(),
            player_name: self.player.name.clone(),
            player_level: if stealth { -1 } else { self.player.level as i32 },
            kind: crate::player::GameKind::Solo,
            won: settlement.outcome.won,
            amount: settlement.outcome.amount,
            timestamp_ms: now_ms,
        })
        .await;
        self.persist().await;
        Ok(settlement.outcome)
    }

    // -------------------------------------------------------------------------
    // ITEMS
    // -------------------------------------------------------------------------

    /// Buy one catalog item with spendable XP.
    pub async fn buy_item(&mut self, item: ItemId) -> Result<(), ShopError> {
        let entry = catalog_entry(item).ok_or(ShopError::UnknownItem)?;
        if self.player.level < entry.min_level {
            return Err(ShopError::LevelTooLow {
                required: entry.min_level,
            });
        }
        if self.player.spendable_xp < entry.price {
            return Err(ShopError::InsufficientXp {
                price: entry.price,
                available: self.player.spendable_xp,
            });
        }
        if let ItemId::Skin(skin) = item {
            if self.player.unlocked_skins.contains(&skin) {
                return Err(ShopError::SkinAlreadyOwned);
            }
            self.player.spendable_xp -= entry.price;
            self.player.unlocked_skins.push(skin);
        } else {
            self.player.spendable_xp -= entry.price;
            self.player.add_item(item, 1);
        }
        self.after_action(&[]);
        self.persist().await;
        Ok(())
    }

    /// Equip an unlocked skin.
    pub async fn equip_skin(&mut self, skin: SkinId) -> Result<(), ShopError> {
        if !self.player.unlocked_skins.contains(&skin) {
            return Err(ShopError::SkinNotOwned);
        }
        self.player.equipped_skin = skin;
        self.persist().await;
        Ok(())
    }

    /// Use (or un-toggle) an owned item.
    ///
    /// Toggleables: first use consumes a unit and arms the flag; using it
    /// again while armed disarms and refunds the unit. Instants resolve
    /// here and cannot be taken back.
    pub async fn use_item(&mut self, item: ItemId) -> Result<(), ShopError> {
        if let ItemId::Skin(_) = item {
            // Skins are entitlements, not consumables.
            return Err(ShopError::UnknownItem);
        }
        if let ItemId::Buff(kind) = item {
            if self.player.active_buffs.is_active(kind) {
                self.player.active_buffs.set(kind, false);
                self.player.add_item(item, 1);
                self.push_event(GameEventData::BuffToggled {
                    item,
                    active: false,
                });
                self.persist().await;
                return Ok(());
            }
        }

        if !self.player.consume_item(item) {
            return Err(ShopError::NotInInventory);
        }

        match item {
            ItemId::Buff(kind) => {
                self.player.active_buffs.set(kind, true);
                self.push_event(GameEventData::BuffToggled { item, active: true });
            }
            ItemId::GambleBox => {
                if self.rng.roll_bp(5_000) {
                    self.player.apply_xp(GAMBLE_BOX_GAIN_XP, &mut self.rng);
                } else {
                    self.player.spendable_xp =
                        self.player.spendable_xp.saturating_sub(GAMBLE_BOX_LOSS_XP);
                }
            }
            ItemId::FlipHint => {
                // A non-binding prediction; cleared with the other flags at
                // the next resolution.
                let side = if self.rng.coin_toss() {
                    CoinSide::Heads
                } else {
                    CoinSide::Tails
                };
                self.player.active_buffs.predicted_side = Some(side);
            }
            // Rejected above.
            ItemId::Skin(_) => unreachable!(),
        }
        self.after_action(&[]);
        self.persist().await;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // BONUSES
    // -------------------------------------------------------------------------

    /// Claim the hourly faucet.
    pub async fn claim_hourly_bonus(&mut self, now_ms: i64) -> Result<i64, SessionError> {
        let elapsed = now_ms - self.player.last_bonus_claim_ms;
        if elapsed < HOURLY_BONUS_COOLDOWN_MS {
            return Err(SessionError::BonusCooldown {
                remaining_ms: HOURLY_BONUS_COOLDOWN_MS - elapsed,
            });
        }
        self.player.balance += HOURLY_BONUS_AMOUNT;
        self.player.last_bonus_claim_ms = now_ms;
        self.player.stats.bonus_streak += 1;
        self.push_event(GameEventData::HourlyBonusClaimed {
            amount: HOURLY_BONUS_AMOUNT,
        });
        self.after_action(&[]);
        self.persist().await;
        Ok(HOURLY_BONUS_AMOUNT)
    }

    /// Arm the daily login reward when a new calendar day has started.
    ///
    /// Streak advances on consecutive days, restarts on a gap or past the
    /// end of the reward table.
    fn check_daily_login(&mut self, now_ms: i64) {
        let today = day_start_ms(now_ms);
        let last = day_start_ms(self.player.last_login_ms);
        let one_day = 24 * 60 * 60 * 1000;
        if today - last < one_day {
            return;
        }

        let mut streak = self.player.login_streak;
        if today - last < 2 * one_day {
            streak += 1;
        } else {
            streak = 1;
        }
        if streak as usize > DAILY_LOGIN_REWARDS.len() {
            streak = 1;
        }

        let (money, xp) = DAILY_LOGIN_REWARDS[(streak - 1) as usize];
        self.pending_login = Some((streak, money, xp));
        self.push_event(GameEventData::LoginBonusAvailable {
            streak,
            reward_money: money,
            reward_xp: xp,
        });
    }

    /// Claim the armed daily login reward.
    pub async fn claim_daily_login(&mut self, now_ms: i64) -> Result<(i64, u64), SessionError> {
        let (streak, money, xp) = self.pending_login.take().ok_or(SessionError::NoLoginBonus)?;
        self.player.balance += money;
        self.player.login_streak = streak;
        self.player.last_login_ms = now_ms;
        if let Some(up) = self.player.apply_xp(xp, &mut self.rng) {
            self.push_event(GameEventData::LevelUp {
                new_level: up.new_level,
                reward_money: up.reward_money,
                bonus_item: up.bonus_item,
            });
        }
        self.push_event(GameEventData::LoginBonusClaimed {
            streak,
            reward_money: money,
        });
        self.after_action(&[]);
        self.persist().await;
        Ok((money, xp))
    }

    // -------------------------------------------------------------------------
    // PVP
    // -------------------------------------------------------------------------

    fn pvp(&mut self) -> Result<&mut PvpClient, RoomError> {
        self.pvp.as_mut().ok_or(RoomError::StoreUnavailable)
    }

    /// Open a duel room as host.
    pub async fn create_duel(&mut self, stake: i64) -> Result<Room, RoomError> {
        let now_ms = Self::now_ms();
        let mut player = std::mem::take(&mut self.player);
        let mut rng = self.rng.clone();
        let result = match self.pvp() {
            Ok(pvp) => pvp.create_room(&mut player, stake, now_ms, &mut rng).await,
            Err(err) => Err(err),
        };
        self.player = player;
        self.rng = rng;
        self.persist().await;
        result
    }

    /// Join a duel room from the lobby.
    pub async fn join_duel(&mut self, lobby_room: &Room) -> Result<Room, RoomError> {
        let mut player = std::mem::take(&mut self.player);
        let result = match self.pvp() {
            Ok(pvp) => pvp.join_room(&mut player, lobby_room).await,
            Err(err) => Err(err),
        };
        self.player = player;
        self.persist().await;
        result
    }

    /// Cancel an own WAITING room.
    pub async fn cancel_duel(&mut self, room: &Room) -> Result<(), RoomError> {
        let mut player = std::mem::take(&mut self.player);
        let result = match self.pvp() {
            Ok(pvp) => pvp.cancel_room(&mut player, room).await,
            Err(err) => Err(err),
        };
        self.player = player;
        self.persist().await;
        result
    }

    /// Host-only: pick a side and commit the draw.
    pub async fn duel_flip(&mut self, room: &Room, side: CoinSide) -> Result<CoinSide, RoomError> {
        let player = self.player.clone();
        let mut rng = self.rng.clone();
        let result = match self.pvp() {
            Ok(pvp) => pvp.host_flip(&player, room, side, &mut rng).await,
            Err(err) => Err(err),
        };
        self.rng = rng;
        result
    }

    /// React to a room update from the subscription. Settles once on
    /// FINISHED; every other status (and duplicate deliveries) is a no-op.
    pub async fn observe_duel(&mut self, room: &Room) -> Result<Option<PvpSettlement>, RoomError> {
        if room.status != RoomStatus::Finished {
            return Ok(None);
        }
        let now_ms = Self::now_ms();
        let mut player = std::mem::take(&mut self.player);
        let mut rng = self.rng.clone();
        let result = match self.pvp() {
            Ok(pvp) => pvp.resolve_finished(&mut player, room, now_ms, &mut rng),
            Err(err) => Err(err),
        };
        self.player = player;
        self.rng = rng;

        let settlement = match result {
            Ok(Some(settlement)) => settlement,
            other => return other,
        };

        if let Some(up) = &settlement.level_up {
            self.push_event(GameEventData::LevelUp {
                new_level: up.new_level,
                reward_money: up.reward_money,
                bonus_item: up.bonus_item,
            });
        }
        self.push_event(GameEventData::PvpResolved {
            won: settlement.won,
            amount: settlement.amount,
            opponent: settlement.opponent.clone(),
        });
        self.after_action(&settlement.completed_quests.clone());

        let is_host = room.is_host(&self.player.id);
        let level = room
            .snapshot_for(is_host)
            .map(|s| s.level)
            .unwrap_or(self.player.level as i32);
        self.append_log(PublicLogEntry {
            player_id: self.player.id.clone(),
            player_name: self.player.name.clone(),
            player_level: level,
            kind: crate::player::GameKind::Pvp,
            won: settlement.won,
            amount: settlement.amount,
            timestamp_ms: now_ms,
        })
        .await;
        self.persist().await;
        Ok(Some(settlement))
    }

    // -------------------------------------------------------------------------
    // CHAT & RESET
    // -------------------------------------------------------------------------

    /// Post a chat line (best-effort).
    pub async fn send_chat(&mut self, text: impl Into<String>) {
        let message = ChatMessage {
            player_id: self.player.id.clone(),
            player_name: self.player.name.clone(),
            text: text.into(),
            timestamp_ms: Self::now_ms(),
        };
        if let Some(store) = &self.store {
            if let Err(err) = store.append_chat(message).await {
                warn!(%err, "chat append failed");
            }
        }
    }

    /// Restore the aggregate to defaults, keeping identity.
    pub async fn reset_self(&mut self) {
        self.player.reset();
        self.player.quests = daily::draw_batch(&mut self.rng);
        self.player.quests_issued_at_ms = Self::now_ms();
        self.persist().await;
    }

    // -------------------------------------------------------------------------
    // ADMINISTRATION
    // -------------------------------------------------------------------------

    async fn require_admin(&self) -> Result<&Arc<dyn GameStore>, AdminError> {
        let store = self.store.as_ref().ok_or(AdminError::StoreUnavailable)?;
        if store.is_admin(&self.player.id).await? {
            Ok(store)
        } else {
            Err(AdminError::NotAuthorized)
        }
    }

    /// Privileged: overwrite another player's balance.
    pub async fn admin_set_balance(&mut self, target: &str, value: i64) -> Result<(), AdminError> {
        let store = self.require_admin().await?;
        let mut player = store
            .get_player(target)
            .await?
            .unwrap_or_else(|| Player::new(target, target));
        player.balance = value;
        store.put_player(&player).await?;
        if target == self.player.id {
            self.player.balance = value;
        }
        info!(target, value, "admin balance override");
        Ok(())
    }

    /// Privileged: overwrite another player's XP pools and recompute level.
    pub async fn admin_set_xp(&mut self, target: &str, value: u64) -> Result<(), AdminError> {
        let store = self.require_admin().await?;
        let mut player = store
            .get_player(target)
            .await?
            .unwrap_or_else(|| Player::new(target, target));
        player.spendable_xp = value;
        player.lifetime_xp = value;
        player.level = crate::economy::level_for_lifetime_xp(value);
        store.put_player(&player).await?;
        if target == self.player.id {
            self.player.spendable_xp = value;
            self.player.lifetime_xp = value;
            self.player.level = player.level;
        }
        info!(target, value, "admin xp override");
        Ok(())
    }

    /// Privileged: flip own forced-win flag.
    pub async fn admin_toggle_god_mode(&mut self) -> Result<bool, AdminError> {
        self.require_admin().await?;
        self.player.god_mode = !self.player.god_mode;
        self.after_action(&[]);
        self.persist().await;
        Ok(self.player.god_mode)
    }

    /// Privileged: extend the allow-list.
    pub async fn admin_grant(&self, target: &str) -> Result<(), AdminError> {
        let store = self.require_admin().await?;
        store.grant_admin(target).await?;
        Ok(())
    }

    /// Privileged: shrink the allow-list. The owner is immune.
    pub async fn admin_revoke(&self, target: &str) -> Result<(), AdminError> {
        let store = self.require_admin().await?;
        if self.owner_id.as_deref() == Some(target) {
            return Err(AdminError::OwnerImmutable);
        }
        store.revoke_admin(target).await?;
        Ok(())
    }

    /// Privileged: wipe rooms, ticker, and chat.
    pub async fn admin_reset_global(&self) -> Result<(), AdminError> {
        let store = self.require_admin().await?;
        store.reset_global().await?;
        Ok(())
    }

    /// Privileged: clear the chat log only.
    pub async fn admin_clear_chat(&self) -> Result<(), AdminError> {
        let store = self.require_admin().await?;
        store.clear_chat().await?;
        Ok(())
    }
}

/// Milliseconds of the UTC midnight containing `ms`.
fn day_start_ms(ms: i64) -> i64 {
    let dt = Utc.timestamp_millis_opt(ms).single().unwrap_or_default();
    let day = Utc
        .with_ymd_and_hms(dt.year(), dt.month(), dt.day(), 0, 0, 0)
        .single()
        .unwrap_or_default();
    day.timestamp_millis()
}

// =============================================================================
// TESTS
// =============================================================================
