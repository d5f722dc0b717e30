//! CoinClash Engine
//!
//! Demo driver: spins up an in-memory shared store, runs two sessions
//! through solo wagers and a full PvP duel, and prints the leaderboard.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coinclash::{
    derive_session_seed,
    game::CoinSide,
    pvp::RoomStatus,
    session::Session,
    store::{GameStore, MemoryStore},
    VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("CoinClash Engine v{}", VERSION);

    demo_session().await
}

/// Demo: two players, solo play, bonuses, and one duel.
async fn demo_session() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let now_ms = Utc::now().timestamp_millis();

    let seed = derive_session_seed("ada", now_ms);
    info!("Session seed: {}", hex::encode(seed.to_le_bytes()));

    let mut ada = Session::start(
        Some(("ada".into(), "Ada".into())),
        Some(store.clone() as Arc<dyn GameStore>),
        now_ms,
    )
    .await;
    let mut bo = Session::start(
        Some(("bo".into(), "Bo".into())),
        Some(store.clone() as Arc<dyn GameStore>),
        now_ms,
    )
    .await;

    // Solo wagers.
    info!("=== Solo Play ===");
    for _ in 0..5 {
        let outcome = ada.solo_flip(50, CoinSide::Heads).await?;
        info!(
            won = outcome.won,
            amount = outcome.amount,
            balance = ada.player().balance,
            "Ada wagered 50 on HEADS"
        );
    }

    // Hourly faucet.
    let bonus = ada.claim_hourly_bonus(now_ms).await?;
    info!(bonus, balance = ada.player().balance, "Ada claimed the hourly bonus");

    // One full duel: Ada hosts, Bo joins, Ada flips, both settle.
    info!("=== PvP Duel ===");
    let room = ada.create_duel(100).await.context("create duel")?;
    info!(room = %room.id, "Ada opened a room for 100");

    let joined = bo.join_duel(&room).await.context("join duel")?;
    info!(room = %joined.id, "Bo joined");

    let result = ada.duel_flip(&joined, CoinSide::Heads).await?;
    info!(%result, "Ada flipped for HEADS");

    // Wait for the room to finish, then settle both sides.
    let mut rx = store.subscribe_room(&room.id).await?;
    let finished = loop {
        if let Some(update) = rx.recv().await? {
            if update.status == RoomStatus::Finished {
                break update;
            }
        }
    };

    let host_settlement = ada.observe_duel(&finished).await?.context("host settlement")?;
    let guest_settlement = bo.observe_duel(&finished).await?.context("guest settlement")?;
    info!(
        won = host_settlement.won,
        amount = host_settlement.amount,
        "Ada settled"
    );
    info!(
        won = guest_settlement.won,
        amount = guest_settlement.amount,
        "Bo settled"
    );

    // Leaderboard.
    info!("=== Leaderboard ===");
    for (i, row) in store.top_balances(10).await?.iter().enumerate() {
        info!("#{}: {} - {} (level {})", i + 1, row.name, row.balance, row.level);
    }

    for event in ada.take_events() {
        info!(?event.data, "Ada event");
    }

    Ok(())
}
