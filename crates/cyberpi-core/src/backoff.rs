//! Reconnect backoff policy

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay applied before reconnect attempts.
///
/// The attempt number counts consecutive failures since the last poll loop
/// run that produced at least one vehicle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffConfig {
    /// Reconnect immediately
    None,

    /// Fixed delay between reconnect attempts
    Fixed { delay_ms: u64 },

    /// Exponential backoff
    Exponential {
        #[serde(default = "default_initial_ms")]
        initial_ms: u64,
        #[serde(default = "default_max_ms")]
        max_ms: u64,
        /// Multiplier for each retry (default: 2.0)
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
}

const fn default_initial_ms() -> u64 {
    500
}

const fn default_max_ms() -> u64 {
    30_000
}

const fn default_multiplier() -> f64 {
    2.0
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::Exponential {
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl BackoffConfig {
    /// Delay before reconnect attempt `attempt` (1-based). Attempt 0 means
    /// no failure has happened yet and never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        match self {
            Self::None => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::Exponential {
                initial_ms,
                max_ms,
                multiplier,
            } => {
                let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                let delay_ms = (*initial_ms as f64) * multiplier.max(1.0).powi(exponent);
                Duration::from_millis(delay_ms.min(*max_ms as f64) as u64)
            }
        }
    }
}
