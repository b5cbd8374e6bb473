//! Bounded retry for read-after-write confirmation of new sessions.

use chatdeck_core::config::ConfirmationConfig;
use std::time::Duration;

/// How many confirmation loads follow a tab binding, and how far apart.
///
/// The delay before attempt `n` (0-based) is
/// `min(initial_delay * backoff_factor^n, max_delay)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl ConfirmationPolicy {
    /// A policy that never issues confirmation loads.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    /// Delay before attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(attempt as i32);
        let scaled_ms = self.initial_delay.as_millis() as f64 * factor;
        if !scaled_ms.is_finite() || scaled_ms >= self.max_delay.as_millis() as f64 {
            self.max_delay
        } else {
            Duration::from_millis(scaled_ms.round() as u64)
        }
    }

    /// Delays of every attempt, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(|attempt| self.delay_for(attempt))
    }
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

impl From<&ConfirmationConfig> for ConfirmationPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            backoff_factor: config.backoff_factor,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}
