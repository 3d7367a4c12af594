//! Configuration for the lab host.
//!
//! The lab configuration bounds deterministic execution:
//! - Total step limit before a run is forced to stop
//! - Microtasks drained per turn before timers get a chance
//! - Virtual start time
//!
//! Values resolve as programmatic > environment > TOML file > defaults; see
//! [`env_config`](super::env_config).

use super::env_config;
use crate::error::Result;

/// Configuration for the lab runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabConfig {
    /// Maximum tasks (microtasks plus timers) run before forced termination.
    /// A timer batch cut short by the limit leaves its remaining timers
    /// registered.
    pub max_steps: Option<u64>,
    /// Maximum microtasks drained in one turn. `None` drains until empty.
    pub max_microtasks_per_turn: Option<usize>,
    /// Virtual tick the clock starts at.
    pub start_tick: u64,
}

impl LabConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_steps: Some(100_000),
            max_microtasks_per_turn: None,
            start_tick: 0,
        }
    }

    /// Defaults overlaid with `XPROMISE_LAB_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();
        env_config::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Defaults overlaid with a TOML file, then with the environment.
    #[cfg(feature = "config-file")]
    pub fn from_file_and_env(path: &std::path::Path) -> Result<Self> {
        let mut config = Self::new();
        let parsed = env_config::parse_toml_file(path)?;
        env_config::apply_toml_config(&mut config, &parsed);
        env_config::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Sets the maximum number of steps.
    #[must_use]
    pub const fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Disables the step limit.
    #[must_use]
    pub const fn no_step_limit(mut self) -> Self {
        self.max_steps = None;
        self
    }

    /// Sets the per-turn microtask budget.
    #[must_use]
    pub const fn max_microtasks_per_turn(mut self, limit: usize) -> Self {
        self.max_microtasks_per_turn = Some(limit);
        self
    }

    /// Sets the virtual start tick.
    #[must_use]
    pub const fn start_tick(mut self, tick: u64) -> Self {
        self.start_tick = tick;
        self
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self::new()
    }
}
