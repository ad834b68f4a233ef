//! Runtime configuration for the binaries.
//!
//! Read once at startup from `BASE_STACK_*` environment variables. The adapter
//! reads its own variables (see `base_stack_adapter::ServerConfig::from_env`).

use thiserror::Error;

use crate::core::SessionConfig;

/// Fixed game-loop step when `BASE_STACK_TICK_MS` is unset.
pub const DEFAULT_TICK_MS: u32 = 50;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid number: {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub tick_ms: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables take defaults;
    /// a missing seed is derived from the wall clock.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seed = match parse_var(&lookup, "BASE_STACK_SEED")? {
            Some(seed) => seed,
            None => clock_seed(),
        };
        let tick_ms = parse_var(&lookup, "BASE_STACK_TICK_MS")?.unwrap_or(DEFAULT_TICK_MS);
        if tick_ms == 0 {
            return Err(ConfigError::Zero {
                var: "BASE_STACK_TICK_MS",
            });
        }

        Ok(Self {
            session: SessionConfig::with_seed(seed),
            tick_ms,
        })
    }
}

fn parse_var<F>(lookup: &F, var: &'static str) -> Result<Option<u32>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ConfigError::NotANumber { var, value: raw })
}

fn clock_seed() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    nanos.max(1)
}
