//! # CoinClash Engine
//!
//! Wagering economy and match resolution for CoinClash, a coin-flip game
//! with solo wagers, buff-driven odds, and head-to-head duels over a shared
//! non-transactional store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     COINCLASH ENGINE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  └── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │                                                              │
//! │  economy/        - Money and XP arithmetic                   │
//! │  ├── payout.rs   - Basis-point stake multipliers             │
//! │  ├── levels.rs   - Lifetime-XP level thresholds              │
//! │  └── xp.rs       - Per-game XP awards                        │
//! │                                                              │
//! │  items/          - Buff registry and shop catalog            │
//! │  game/           - Solo wager resolution                     │
//! │  quests/         - Daily quests and achievements             │
//! │  player/         - The player aggregate                      │
//! │                                                              │
//! │  store/          - Shared KV store (rooms, logs, chat)       │
//! │  pvp/            - Room protocol over the store              │
//! │  session.rs      - One player's controller                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Every probabilistic rule (win draws, critical rolls, loss mitigation,
//! reward picks) is expressed in basis points and drawn from a seeded
//! Xorshift128+ stream. No floating point enters any balance or XP path;
//! a session seeded identically replays identically.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod economy;
pub mod game;
pub mod items;
pub mod player;
pub mod pvp;
pub mod quests;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use crate::core::rng::{derive_session_seed, GameRng, BP_SCALE};
pub use game::{CoinSide, SoloOutcome, WagerError};
pub use player::Player;
pub use pvp::{Room, RoomError, RoomStatus};
pub use session::Session;
pub use store::{GameStore, MemoryStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
