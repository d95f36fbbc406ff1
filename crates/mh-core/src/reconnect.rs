//! Bounded backoff for reconnection

use std::time::Duration;

use crate::config::ReconnectConfig;

/// Delay schedule for reconnection attempts, with an optional attempt limit
pub struct ReconnectBackoff {
    /// Delay for the first attempt of a cycle
    initial: Duration,
    /// Current delay
    current: Duration,
    /// Maximum delay
    max: Duration,
    /// Multiplier
    multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    jitter: f64,
    /// Attempt limit (None = unlimited)
    max_attempts: Option<u32>,
    /// Attempts handed out in this cycle
    attempts: u32,
}

impl ReconnectBackoff {
    /// Create a new backoff from configuration
    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            config.delay,
            config.max_delay.max(config.delay),
            config.multiplier,
            config.jitter,
            (config.max_attempts > 0).then_some(config.max_attempts),
        )
    }

    /// Create a new backoff with custom parameters
    pub fn new(
        initial: Duration,
        max: Duration,
        multiplier: f64,
        jitter: f64,
        max_attempts: Option<u32>,
    ) -> Self {
        Self {
            initial,
            current: initial,
            max,
            multiplier,
            jitter,
            max_attempts,
            attempts: 0,
        }
    }

    /// Get the delay before the next attempt and advance the backoff.
    ///
    /// Returns `None` once the attempt limit is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(limit) = self.max_attempts {
            if self.attempts >= limit {
                return None;
            }
        }
        self.attempts += 1;

        let delay = self.current;

        let next = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max);
        self.current = std::cmp::min(next, self.max);

        if self.jitter > 0.0 {
            let jitter_amount = delay.as_secs_f64() * self.jitter * rand::random::<f64>();
            Some(delay + Duration::from_secs_f64(jitter_amount))
        } else {
            Some(delay)
        }
    }

    /// Attempts handed out since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start a new cycle
    pub fn reset(&mut self) {
        self.current = self.initial;
        self.attempts = 0;
    }
}
