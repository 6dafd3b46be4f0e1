//! Randomized execution contexts.
//!
//! One context per level of the test-execution hierarchy (suite → class →
//! method → repetition). Each context owns exactly one resolved seed and one
//! lazily constructed generator; entering a nested scope derives a child
//! context, leaving it invalidates the child's generator.
//!
//! See `tree.rs` for the arena implementation.

mod tree;

pub use tree::{ContextHandle, ContextTree, DerivationError};
