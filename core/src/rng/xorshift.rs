//! xorshift64* random number generator
//!
//! A fast, high-quality PRNG with 64-bit state and 64-bit output, suitable
//! where a context needs an inexpensive deterministic stream.
//!
//! # Determinism
//!
//! Same seed → same sequence of random numbers. This is the whole point:
//! a failing test replays exactly when its seed chain is re-supplied.

use super::RandomSource;
use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use randomized_testing_core_rs::{RandomSource, Xorshift64Star};
///
/// let mut rng = Xorshift64Star::new(12345);
/// let value = rng.next_u64();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xorshift64Star {
    /// Internal state (64-bit)
    state: u64,
}

impl Xorshift64Star {
    /// Create a new RNG with the given seed.
    ///
    /// A zero seed is mapped to 1 (xorshift requires non-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }
}

impl RandomSource for Xorshift64Star {
    fn next_u64(&mut self) -> u64 {
        // xorshift64* algorithm
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}
