//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for fast, high-quality, deterministic randomness.
//! Every probabilistic rule in the engine (win draws, critical rolls,
//! loss-mitigation rolls, reward picks) pulls from one of these, so a
//! session seeded identically replays identically.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Basis-point scale: 10_000 = 100%.
pub const BP_SCALE: u32 = 10_000;

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG produces the exact same sequence of
/// values on any platform. Probability draws are expressed in basis
/// points (1/10_000) so no floating point enters the outcome path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRng {
    state: [u64; 2],
}

impl Default for GameRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl GameRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create an RNG seeded from session parameters.
    ///
    /// Derives a deterministic seed from the player identity and the
    /// session start timestamp, so two sessions never share a stream.
    pub fn from_session_params(player_id: &str, started_at_ms: i64) -> Self {
        Self::new(derive_session_seed(player_id, started_at_ms))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // Simple modulo - slight bias for very large max, but acceptable
        (self.next_u64() % max as u64) as u32
    }

    /// Draw a weighted boolean: true with probability `chance_bp` basis
    /// points out of [`BP_SCALE`].
    ///
    /// `chance_bp >= BP_SCALE` always wins; 0 never does.
    #[inline]
    pub fn roll_bp(&mut self, chance_bp: u32) -> bool {
        self.next_int(BP_SCALE) < chance_bp
    }

    /// Draw an even 50/50 boolean.
    #[inline]
    pub fn coin_toss(&mut self) -> bool {
        self.next_u64() & 1 == 0
    }

    /// Generate a 4-digit human-typeable room code ("1000".."9999").
    pub fn room_code(&mut self) -> String {
        (1000 + self.next_int(9000)).to_string()
    }

    /// Select a random element from a slice.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        if slice.is_empty() {
            None
        } else {
            let idx = self.next_int(slice.len() as u32) as usize;
            Some(&slice[idx])
        }
    }

    /// Shuffle a slice in place using Fisher-Yates.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        let len = slice.len();
        for i in (1..len).rev() {
            let j = self.next_int((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a session seed from the player identity and start time.
///
/// The seed only has to be unique per session, not unpredictable: the
/// engine resolves wagers locally, so there is no adversary to hide the
/// stream from. Hashing keeps distinct identities well separated.
pub fn derive_session_seed(player_id: &str, started_at_ms: i64) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"COINCLASH_SEED_V1");
    hasher.update(player_id.as_bytes());
    hasher.update(started_at_ms.to_le_bytes());

    let hash = hasher.finalize();

    // Take first 8 bytes as seed
    u64::from_le_bytes(hash[0..8].try_into().unwrap())
}

// =============================================================================
// TESTS
// =============================================================================
