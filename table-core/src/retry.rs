//! Retry backoff for rejoining a room after the host went away.
//!
//! Migration has a hard deadline (the session's migration timeout), so the
//! delays here are short: exponential from `base`, capped at `max`, plus a
//! random jitter so peers that lost the same host do not dial in lockstep.

use std::time::Duration;

/// Exponential backoff with jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on the exponential part.
    pub max: Duration,
    /// Upper bound on the random jitter added to every delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            max: Duration::from_secs(2),
            jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Policy without jitter, for deterministic tests.
    pub fn fixed(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            jitter: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    ///
    /// Formula: min(max, base * 2^(attempt-1))
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }

    /// Delay before retry number `attempt`, jitter included.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt) + self.random_jitter()
    }

    fn random_jitter(&self) -> Duration {
        let range = self.jitter.as_millis() as u64;
        if range == 0 {
            return Duration::ZERO;
        }
        let mut bytes = [0u8; 8];
        // No entropy means no jitter, not a failed retry.
        if getrandom::getrandom(&mut bytes).is_err() {
            return Duration::ZERO;
        }
        Duration::from_millis(u64::from_le_bytes(bytes) % (range + 1))
    }
}
