//! Bounded reconnect policy and the injected time source.

use std::time::Duration;

use async_trait::async_trait;

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every attempt.
    Fixed,
    /// Doubles per attempt, capped at `max_delay`.
    Exponential { max_delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Automatic attempts after an unexpected closure before giving up.
    pub max_attempts: u32,
    /// Base delay before an attempt.
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(1),
            backoff: Backoff::Fixed,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                let shift = attempt.saturating_sub(1).min(31);
                self.delay
                    .checked_mul(1u32 << shift)
                    .unwrap_or(max_delay)
                    .min(max_delay)
            }
        }
    }
}

/// Time source for reconnect delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, dur: Duration);
}

/// Real time via `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}
