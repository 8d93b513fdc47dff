//! Bounded retry with a fixed delay for malformed provider responses.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default attempts per live fetch, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause before each attempt after the first.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Retry behaviour shared by every live fetch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never below 1.
    pub max_attempts: u32,
    /// Constant delay slept before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, delay: DEFAULT_RETRY_DELAY }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before attempt number `attempt` (1-based); zero for the first.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 { Duration::ZERO } else { self.delay }
    }
}
