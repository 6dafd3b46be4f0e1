//! Deterministic random number generation.
//!
//! Generators are small, seeded, in-repo algorithms behind the
//! [`RandomSource`] trait; a [`RandomFactory`] maps a 64-bit seed to a fresh
//! generator instance. Which algorithm backs a run is selected by name
//! through the [`FactoryKind`] registry, validated at startup.
//!
//! CRITICAL: All randomness handed to test code MUST come from a context's
//! generator; nothing here reads ambient entropy.

mod xoroshiro;
mod xorshift;

pub mod exclusive;

pub use xoroshiro::Xoroshiro128Plus;
pub use xorshift::Xorshift64Star;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A deterministic stream of 64-bit values.
///
/// Implementations must be fully determined by their construction seed: the
/// same seed always yields the same sequence. The `Debug` representation
/// exposes the generator's current state and backs the exclusive wrapper's
/// string/fingerprint operations.
pub trait RandomSource: fmt::Debug + Send {
    /// Generate the next value, advancing the internal state.
    fn next_u64(&mut self) -> u64;

    /// Fill `dest` with random bytes.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Constructor mapping a 64-bit seed to a generator instance.
///
/// Shared by every context in a tree; cloning is cheap.
pub type RandomFactory = Arc<dyn Fn(u64) -> Box<dyn RandomSource + Send> + Send + Sync>;

/// Error raised when a factory name does not match any registered generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown random factory \"{name}\" [valid values: {valid}]")]
pub struct FactoryError {
    /// The unrecognized selection
    pub name: String,
    /// Comma-separated list of accepted names
    pub valid: String,
}

/// Registry of named generator constructors.
///
/// # Example
/// ```
/// use randomized_testing_core_rs::FactoryKind;
///
/// let kind = FactoryKind::parse("xoroshiro128plus").unwrap();
/// assert_eq!(kind, FactoryKind::Xoroshiro128Plus);
///
/// let factory = kind.factory();
/// let mut a = factory(42);
/// let mut b = factory(42);
/// assert_eq!(a.next_u64(), b.next_u64());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactoryKind {
    /// xoroshiro128+ (default)
    Xoroshiro128Plus,
    /// xorshift64*
    Xorshift64Star,
}

impl FactoryKind {
    const REGISTRY: [(&'static str, FactoryKind); 2] = [
        ("xoroshiro128plus", FactoryKind::Xoroshiro128Plus),
        ("xorshift64star", FactoryKind::Xorshift64Star),
    ];

    /// Resolve a configured factory name, case-insensitively.
    ///
    /// Fails fast on an unrecognized name, listing every valid selection.
    pub fn parse(name: &str) -> Result<Self, FactoryError> {
        let wanted = name.trim().to_ascii_lowercase();
        for (candidate, kind) in Self::REGISTRY {
            if candidate == wanted {
                return Ok(kind);
            }
        }
        Err(FactoryError {
            name: name.to_string(),
            valid: Self::REGISTRY
                .iter()
                .map(|(n, _)| *n)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// The constructor for this registry entry.
    pub fn factory(self) -> RandomFactory {
        match self {
            FactoryKind::Xoroshiro128Plus => {
                Arc::new(|seed| Box::new(Xoroshiro128Plus::new(seed)))
            }
            FactoryKind::Xorshift64Star => Arc::new(|seed| Box::new(Xorshift64Star::new(seed))),
        }
    }
}

impl Default for FactoryKind {
    fn default() -> Self {
        FactoryKind::Xoroshiro128Plus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            FactoryKind::parse("XOROSHIRO128PLUS").unwrap(),
            FactoryKind::Xoroshiro128Plus
        );
        assert_eq!(
            FactoryKind::parse("  XorShift64Star  ").unwrap(),
            FactoryKind::Xorshift64Star
        );
    }

    #[test]
    fn test_parse_unknown_lists_valid_names() {
        let err = FactoryKind::parse("mersenne").unwrap_err();
        assert_eq!(err.name, "mersenne");
        assert!(err.valid.contains("xoroshiro128plus"));
        assert!(err.valid.contains("xorshift64star"));
    }

    #[test]
    fn test_fill_bytes_partial_chunk() {
        let mut rng = Xorshift64Star::new(7);
        let mut buf = [0u8; 11];
        rng.fill_bytes(&mut buf);

        // Same seed, same bytes, including the 3-byte tail chunk.
        let mut rng2 = Xorshift64Star::new(7);
        let mut buf2 = [0u8; 11];
        rng2.fill_bytes(&mut buf2);
        assert_eq!(buf, buf2);
        assert_ne!(buf, [0u8; 11]);
    }
}
