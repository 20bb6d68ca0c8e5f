//! Application-level retry configuration with exponential backoff.
//!
//! SDK-level retries are disabled everywhere; the only retry loop lives in
//! the measurement client so each attempt gets a fresh timer and backoff
//! never pollutes TTFT.

use std::time::Duration;

/// Retry configuration for the measurement client.
///
/// Deliberately deterministic: backoff delays must be reproducible in
/// tests, so there is no jitter term.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempt ceiling, including the first attempt.
    pub max_attempts: u32,
    /// Base delay before the first retry.
    pub base_delay: Duration,
    /// Backoff multiplier applied per attempt.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a config with a custom attempt ceiling.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the base delay.
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Backoff delay after a failed attempt (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64();
        Duration::from_secs_f64(base * self.multiplier.powi(attempt as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_delays_double_per_attempt() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_custom_base_and_multiplier() {
        let config = RetryConfig::with_max_attempts(5)
            .base_delay(Duration::from_millis(100))
            .multiplier(3.0);

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(300));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(900));
    }
}
