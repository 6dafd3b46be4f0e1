//! Run configuration consumed from the integration layer.
//!
//! The core owns none of these knobs; the test-runner integration collects
//! them (system properties, launcher parameters, whatever applies) and hands
//! them over as one serde-friendly struct. Everything is validated here, at
//! startup, so a malformed run configuration fails before any test executes.

use crate::context::ContextTree;
use crate::rng::{FactoryError, FactoryKind};
use crate::seed::{SeedChain, SeedFormatError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while assembling a run from configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The root seed chain text is malformed
    #[error(transparent)]
    SeedFormat(#[from] SeedFormatError),

    /// The named random factory does not exist
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

/// Complete run configuration for the randomization core.
///
/// # Example
/// ```
/// use randomized_testing_core_rs::{RunConfig, Seed};
///
/// let config = RunConfig {
///     seed: Some("dead:beef".to_string()),
///     random_factory: None,
///     asserting: true,
/// };
/// let tree = config.build("suite").unwrap();
/// assert_eq!(tree.root_seed(), Seed::Concrete(0xDEAD));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Root seed chain text. If absent (or `"*"`), a random root seed is
    /// picked once for the run.
    #[serde(default)]
    pub seed: Option<String>,

    /// Name of the factory used to create generator instances. If absent,
    /// xoroshiro128+ is used.
    #[serde(default)]
    pub random_factory: Option<String>,

    /// Enables the thread-exclusive generator guard (forbidding cross-thread
    /// and out-of-scope access). On by default; disabling it trades the
    /// sanity checks for raw generator access.
    #[serde(default = "default_asserting")]
    pub asserting: bool,
}

fn default_asserting() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            random_factory: None,
            asserting: true,
        }
    }
}

impl RunConfig {
    /// Validate the configuration and construct the run's context tree.
    ///
    /// Fails fast on malformed seed text or an unknown factory name; neither
    /// is recoverable.
    pub fn build(&self, root_id: &str) -> Result<ContextTree, ConfigError> {
        let chain = SeedChain::parse(self.seed.as_deref().unwrap_or("*"))?;
        let kind = match &self.random_factory {
            Some(name) => FactoryKind::parse(name)?,
            None => FactoryKind::default(),
        };
        Ok(ContextTree::new(
            root_id,
            &chain,
            kind.factory(),
            self.asserting,
        ))
    }
}
