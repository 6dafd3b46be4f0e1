//! xoroshiro128+ random number generator
//!
//! The default generator. 128-bit state expanded from the 64-bit context
//! seed with splitmix64, so nearby seeds still start in well-separated
//! states.

use super::RandomSource;
use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xoroshiro128+
///
/// # Example
/// ```
/// use randomized_testing_core_rs::{RandomSource, Xoroshiro128Plus};
///
/// let mut rng = Xoroshiro128Plus::new(0xDEAD);
/// let value = rng.next_u64();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Xoroshiro128Plus {
    s0: u64,
    s1: u64,
}

/// splitmix64 step, used only for state expansion.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

impl Xoroshiro128Plus {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let s0 = splitmix64(&mut sm);
        let mut s1 = splitmix64(&mut sm);
        // xoroshiro requires non-zero state; unreachable through splitmix64
        // for any practical seed, but cheap to pin down.
        if s0 == 0 && s1 == 0 {
            s1 = 0x9E3779B97F4A7C15;
        }
        Self { s0, s1 }
    }
}

impl RandomSource for Xoroshiro128Plus {
    fn next_u64(&mut self) -> u64 {
        // xoroshiro128+ algorithm
        let result = self.s0.wrapping_add(self.s1);
        let t = self.s1 ^ self.s0;
        self.s0 = self.s0.rotate_left(24) ^ t ^ (t << 16);
        self.s1 = t.rotate_left(37);
        result
    }
}
