//! Core deterministic primitives.
//!
//! Everything that touches randomness lives here so that gameplay outcomes
//! can be replayed exactly from a recorded seed.

pub mod rng;

pub use rng::{derive_session_seed, GameRng, BP_SCALE};
