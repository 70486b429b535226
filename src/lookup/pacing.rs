//! Request pacing
//!
//! The lookup site is hit with a fixed politeness delay before every request,
//! independent of server load. The delay is a value rather than a hard-coded
//! sleep so tests can run with [`PacingPolicy::none`].

use std::time::Duration;

/// Fixed delay applied before each outbound lookup request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    delay: Duration,
}

impl PacingPolicy {
    /// Creates a policy that waits `delay` before every request
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a policy that never waits
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// The configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleeps for the configured delay
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            return;
        }
        tracing::trace!(delay_ms = self.delay.as_millis() as u64, "Pacing before request");
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}
