//! Client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_millis;
use crate::error::ConfigError;

/// Configuration for the interactive client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prompt shown before each input line
    pub prompt: String,

    /// Show the welcome banner at startup
    pub banner: bool,

    /// Reconnection policy handed to the transport
    pub reconnect: ReconnectConfig,

    /// Upper bound for a single connection attempt (WebSocket + handshake)
    #[serde(with = "duration_millis")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            prompt: "MayHost ~$ ".to_string(),
            banner: true,
            reconnect: ReconnectConfig::default(),
            connect_timeout: Duration::from_millis(10_000),
        }
    }
}

impl ClientConfig {
    /// Check values that would make the client misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "connect_timeout must be greater than zero".to_string(),
            ));
        }
        self.reconnect.validate()
    }
}

/// Reconnection policy
///
/// The defaults give a fixed 1 s delay and at most five attempts. Raising
/// `multiplier` above 1.0 turns the fixed delay into exponential backoff
/// capped at `max_delay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Reconnect automatically after a lost or failed connection
    pub enabled: bool,

    /// Delay before the first reconnection attempt
    #[serde(with = "duration_millis")]
    pub delay: Duration,

    /// Maximum delay between attempts
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each attempt
    pub multiplier: f64,

    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,

    /// Maximum attempts per reconnection cycle; 0 means unlimited
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(1000),
            multiplier: 1.0,
            jitter: 0.0,
            max_attempts: 5,
        }
    }
}

impl ReconnectConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "reconnect.multiplier must be a finite number of at least 1.0 (got {})",
                self.multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Invalid(format!(
                "reconnect.jitter must be between 0.0 and 1.0 (got {})",
                self.jitter
            )));
        }
        Ok(())
    }
}
