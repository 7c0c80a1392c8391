//! Named, independently schedulable units of work with a uniform retry
//! policy. The scheduler and the pipeline orchestrator only ever see this
//! interface.

use async_trait::async_trait;

/// One schedulable unit of work. Implementations are idempotent so that a
/// scheduled run, a manual trigger, and a retry all behave identically.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;
    /// Runs one complete query/write cycle. The `Ok` value is a short
    /// human-readable status summary; errors propagate to the retry wrapper.
    async fn run(&self) -> anyhow::Result<String>;
}

/// Uniform retry policy: exponential backoff, capped, with randomized jitter
/// added by the executor. Identical for every task in the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based), doubling per attempt
    /// and capped at `max_delay_ms`. Jitter is the executor's concern.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_ms(1), 1_000);
        assert_eq!(policy.backoff_ms(2), 2_000);
        assert_eq!(policy.backoff_ms(3), 4_000);
        assert_eq!(policy.backoff_ms(10), 60_000);
    }

    #[test]
    fn test_backoff_does_not_overflow_on_large_attempts() {
        let policy = RetryPolicy {
            max_attempts: 100,
            base_delay_ms: u64::MAX / 2,
            max_delay_ms: u64::MAX,
        };
        let _ = policy.backoff_ms(90);
    }
}
