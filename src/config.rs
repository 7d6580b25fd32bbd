//! Room tuning knobs with env overrides.
//!
//! DESIGN
//! ======
//! Compiled defaults match the original deployment values; each can be
//! overridden through an environment variable for load testing without a
//! rebuild. Unset or unparsable values fall back to the default.

use std::time::Duration;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Broadcast rate limit for pointer and selection events.
const DEFAULT_THROTTLE_MS: u64 = 50;

/// How long a focused highlight pulses before the signal auto-clears.
const DEFAULT_FOCUS_PULSE_MS: u64 = 1500;

/// Capacity of the per-room command and inbound event channels.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Per-room configuration, shared by the collaboration and chat coordinators.
#[derive(Debug, Clone, Copy)]
pub struct RoomConfig {
    pub throttle: Duration,
    pub focus_pulse: Duration,
    pub channel_capacity: usize,
}

impl RoomConfig {
    /// Build a config from the environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            throttle: Duration::from_millis(env_parse("COREAD_THROTTLE_MS", DEFAULT_THROTTLE_MS)),
            focus_pulse: Duration::from_millis(env_parse("COREAD_FOCUS_PULSE_MS", DEFAULT_FOCUS_PULSE_MS)),
            channel_capacity: env_parse("COREAD_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY),
        }
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            focus_pulse: Duration::from_millis(DEFAULT_FOCUS_PULSE_MS),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
