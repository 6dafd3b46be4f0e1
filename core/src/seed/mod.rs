//! Seed and seed-chain value types.
//!
//! A [`Seed`] is a single 64-bit randomization source value, or the
//! "unspecified" marker meaning "derive automatically". A [`SeedChain`] is an
//! ordered sequence of seeds identifying one path through the execution
//! hierarchy, with a stable textual grammar:
//!
//! ```text
//! "[" component (":" component)* "]"
//! ```
//!
//! Brackets are optional on input. Each component is, case-insensitively,
//! `*`, the empty string, or a hexadecimal number. Canonical output is always
//! bracketed, uppercase, with `*` for unspecified components.
//!
//! # Key Principles
//!
//! 1. **Round-trip stability**: `parse(chain.to_string()) == chain` for every
//!    chain produced by [`SeedChain::parse`]
//! 2. **Tagged unspecified**: `0` is a legitimate concrete seed, so the
//!    unspecified marker is an enum variant, never a magic value

pub mod hashing;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error raised when seed-chain text does not match the grammar.
///
/// Carries the offending component and the full source text so the failing
/// configuration value can be identified without additional context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid component \"{token}\" in seed chain: {text}")]
pub struct SeedFormatError {
    /// The component that failed to parse (trimmed, lowercased)
    pub token: String,
    /// The complete input text the component came from
    pub text: String,
}

/// A single randomization source value.
///
/// # Example
/// ```
/// use randomized_testing_core_rs::Seed;
///
/// assert_eq!(Seed::Concrete(0xDEAD).to_string(), "DEAD");
/// assert_eq!(Seed::Unspecified.to_string(), "*");
/// assert_eq!(Seed::Concrete(0).to_string(), "0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seed {
    /// A concrete 64-bit seed value
    Concrete(u64),
    /// Placeholder meaning "derive this seed automatically"
    Unspecified,
}

impl Seed {
    /// Whether this seed is the unspecified placeholder.
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Seed::Unspecified)
    }

    /// The concrete value, if any.
    pub fn value(&self) -> Option<u64> {
        match self {
            Seed::Concrete(v) => Some(*v),
            Seed::Unspecified => None,
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Uppercase hex, minimal digits ("0" for zero).
            Seed::Concrete(v) => write!(f, "{:X}", v),
            Seed::Unspecified => write!(f, "*"),
        }
    }
}

/// An ordered sequence of seeds identifying a path through the hierarchy.
///
/// # Example
/// ```
/// use randomized_testing_core_rs::{Seed, SeedChain};
///
/// let chain = SeedChain::parse("dead:beef:cafe").unwrap();
/// assert_eq!(chain.to_string(), "[DEAD:BEEF:CAFE]");
///
/// let (first, rest) = chain.pop();
/// assert_eq!(first, Seed::Concrete(0xDEAD));
/// assert_eq!(rest.to_string(), "[BEEF:CAFE]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeedChain {
    seeds: Vec<Seed>,
}

impl SeedChain {
    /// Create a chain from an explicit seed sequence.
    pub fn new(seeds: Vec<Seed>) -> Self {
        Self { seeds }
    }

    /// The empty chain.
    pub fn empty() -> Self {
        Self { seeds: Vec::new() }
    }

    /// Parse seed-chain text.
    ///
    /// Surrounding brackets are stripped, the text is split on `:`, and each
    /// component is trimmed and lowercased. Empty components and `*` parse as
    /// [`Seed::Unspecified`]; hexadecimal components parse as
    /// [`Seed::Concrete`]. Anything else fails with [`SeedFormatError`].
    pub fn parse(text: &str) -> Result<Self, SeedFormatError> {
        let stripped = text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']');

        let mut seeds = Vec::new();
        for raw in stripped.split(':') {
            let token = raw.trim().to_ascii_lowercase();
            if token.is_empty() || token == "*" {
                seeds.push(Seed::Unspecified);
                continue;
            }
            if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(SeedFormatError {
                    token,
                    text: text.to_string(),
                });
            }
            // Rejects values wider than 64 bits as malformed.
            let value = u64::from_str_radix(&token, 16).map_err(|_| SeedFormatError {
                token: token.clone(),
                text: text.to_string(),
            })?;
            seeds.push(Seed::Concrete(value));
        }
        Ok(Self { seeds })
    }

    /// The seeds in order, root first.
    pub fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    /// Whether the chain has no components.
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Number of components in the chain.
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Split off the first seed, returning it together with the remainder.
    ///
    /// An empty chain pops `(Seed::Unspecified, empty)`, so callers never
    /// need a separate exhaustion branch.
    pub fn pop(&self) -> (Seed, SeedChain) {
        match self.seeds.split_first() {
            None => (Seed::Unspecified, SeedChain::empty()),
            Some((first, rest)) => (*first, SeedChain::new(rest.to_vec())),
        }
    }
}

impl fmt::Display for SeedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, seed) in self.seeds.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{}", seed)?;
        }
        write!(f, "]")
    }
}

impl FromStr for SeedChain {
    type Err = SeedFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeedChain::parse(s)
    }
}

impl TryFrom<String> for SeedChain {
    type Error = SeedFormatError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        SeedChain::parse(&s)
    }
}

impl From<SeedChain> for String {
    fn from(chain: SeedChain) -> String {
        chain.to_string()
    }
}
