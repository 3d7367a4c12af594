//! Environment variable and config file support for [`LabConfig`].
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: builder setters applied after loading
//! 2. **Environment variables**: `XPROMISE_LAB_*`
//! 3. **Config file**: a `[lab]` TOML table (requires `config-file` feature)
//! 4. **Defaults**: [`LabConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `XPROMISE_LAB_MAX_STEPS` | `u64`, `0` = unlimited | `max_steps` |
//! | `XPROMISE_LAB_MAX_MICROTASKS_PER_TURN` | `usize`, `0` = unlimited | `max_microtasks_per_turn` |
//! | `XPROMISE_LAB_START_TICK` | `u64` | `start_tick` |

use super::LabConfig;
use crate::error::{Error, Result};

/// Environment variable name for the step limit.
pub const ENV_MAX_STEPS: &str = "XPROMISE_LAB_MAX_STEPS";
/// Environment variable name for the per-turn microtask budget.
pub const ENV_MAX_MICROTASKS_PER_TURN: &str = "XPROMISE_LAB_MAX_MICROTASKS_PER_TURN";
/// Environment variable name for the virtual start tick.
pub const ENV_START_TICK: &str = "XPROMISE_LAB_START_TICK";

/// Apply environment variable overrides to a [`LabConfig`].
///
/// Only variables that are set are applied. A set but unparseable variable
/// is an [`ErrorKind::InvalidConfig`](crate::error::ErrorKind::InvalidConfig)
/// error and leaves `config` partially updated.
pub fn apply_env_overrides(config: &mut LabConfig) -> Result<()> {
    if let Some(val) = read_env(ENV_MAX_STEPS) {
        config.max_steps = nonzero(parse_u64(ENV_MAX_STEPS, &val)?);
    }
    if let Some(val) = read_env(ENV_MAX_MICROTASKS_PER_TURN) {
        config.max_microtasks_per_turn =
            nonzero(parse_usize(ENV_MAX_MICROTASKS_PER_TURN, &val)?);
    }
    if let Some(val) = read_env(ENV_START_TICK) {
        config.start_tick = parse_u64(ENV_START_TICK, &val)?;
    }
    Ok(())
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// `0` means "no limit".
fn nonzero<N: Default + PartialEq>(value: N) -> Option<N> {
    if value == N::default() {
        None
    } else {
        Some(value)
    }
}

fn parse_u64(var_name: &str, val: &str) -> Result<u64> {
    val.trim().parse::<u64>().map_err(|e| {
        Error::invalid_config(format!(
            "invalid value for {var_name}: expected unsigned integer, got {val:?} ({e})"
        ))
    })
}

fn parse_usize(var_name: &str, val: &str) -> Result<usize> {
    val.trim().parse::<usize>().map_err(|e| {
        Error::invalid_config(format!(
            "invalid value for {var_name}: expected unsigned integer, got {val:?} ({e})"
        ))
    })
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable lab configuration.
///
/// ```toml
/// [lab]
/// max_steps = 50000        # 0 = unlimited
/// max_microtasks_per_turn = 64
/// start_tick = 1000
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct LabTomlConfig {
    /// Lab settings.
    #[serde(default)]
    pub lab: LabToml,
}

/// `[lab]` section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct LabToml {
    /// Step limit, `0` for unlimited.
    pub max_steps: Option<u64>,
    /// Per-turn microtask budget, `0` for unlimited.
    pub max_microtasks_per_turn: Option<usize>,
    /// Virtual start tick.
    pub start_tick: Option<u64>,
}

/// Apply a parsed TOML config to a [`LabConfig`].
///
/// Only fields present in the file override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut LabConfig, toml: &LabTomlConfig) {
    if let Some(v) = toml.lab.max_steps {
        config.max_steps = nonzero(v);
    }
    if let Some(v) = toml.lab.max_microtasks_per_turn {
        config.max_microtasks_per_turn = nonzero(v);
    }
    if let Some(v) = toml.lab.start_tick {
        config.start_tick = v;
    }
}

/// Parse a TOML string into a [`LabTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<LabTomlConfig> {
    toml::from_str(toml_str)
        .map_err(|e| Error::invalid_config(format!("failed to parse TOML config: {e}")))
}

/// Read and parse a TOML file into a [`LabTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<LabTomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::new(crate::error::ErrorKind::ConfigUnreadable)
            .with_message(format!("failed to read config file {}", path.display()))
            .with_source(e)
    })?;
    parse_toml_str(&content)
}

// =========================================================================
// Tests
// =========================================================================
