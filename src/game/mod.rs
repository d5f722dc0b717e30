//! Wager resolution.
//!
//! `solo` turns a stake plus the player's active buffs into a settled
//! outcome; `events` carries the UI-facing notifications those
//! resolutions emit.

pub mod events;
pub mod solo;

use serde::{Deserialize, Serialize};

pub use events::GameEvent;
pub use solo::{SoloOutcome, WagerError};

/// The two faces of the coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    /// The other face.
    pub fn opposite(self) -> Self {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }
}

impl std::fmt::Display for CoinSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}
