//! Randomized Testing Core - Rust Engine
//!
//! Reproducible pseudo-randomness for nested test-execution hierarchies
//! (suite → class → method → repetition). Every level of the hierarchy gets a
//! deterministically derived seed, so any failing execution can be replayed
//! exactly by re-supplying the seed chain that was active when it failed.
//!
//! # Architecture
//!
//! - **seed**: Seed and SeedChain value types with a stable textual grammar
//! - **context**: Context tree holding per-scope derivation state
//! - **rng**: Random sources, the named factory registry, and the
//!   thread-exclusive generator wrapper
//! - **config**: Run configuration consumed from the integration layer
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic given the root seed and the sequence
//!    of visited scope ids
//! 2. A constructed context's seed is never unspecified
//! 3. A context's generator is bound to one thread and one scope lifetime;
//!    violations are reported, never silently tolerated

// Module declarations
pub mod config;
pub mod context;
pub mod rng;
pub mod seed;

// Re-exports for convenience
pub use config::{ConfigError, RunConfig};
pub use context::{ContextHandle, ContextTree, DerivationError};
pub use rng::{
    exclusive::{ExclusiveRandom, RandomAccessError},
    FactoryError, FactoryKind, RandomFactory, RandomSource, Xoroshiro128Plus, Xorshift64Star,
};
pub use seed::{
    hashing::{long_hash, mix64},
    Seed, SeedChain, SeedFormatError,
};
