//! Retry policy for transient connection failures
//!
//! The prober opens (and re-opens) TCP connections through a [`ConnectPolicy`]:
//! a bounded number of attempts separated by a [`Backoff`] delay. Sleeping is
//! delegated to a [`Sleeper`] so tests can observe the delays without waiting.

use super::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Delay schedule between consecutive attempts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed(Duration),
    /// `initial + step * (retry - 1)`
    Linear { initial: Duration, step: Duration },
    /// `initial * multiplier^(retry - 1)`, capped at `max`
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

impl Backoff {
    /// Delay to wait before retry number `retry` (1-based: the delay after the first failure is `delay(1)`)
    pub fn delay(&self, retry: usize) -> Duration {
        let n = retry.saturating_sub(1);
        match *self {
            Backoff::Fixed(delay) => delay,
            Backoff::Linear { initial, step } => initial + step * n as u32,
            Backoff::Exponential { initial, multiplier, max } => {
                let secs = initial.as_secs_f64() * multiplier.powi(n as i32);
                if !secs.is_finite() || secs >= max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backoff::Fixed(_) => "fixed",
            Backoff::Linear { .. } => "linear",
            Backoff::Exponential { .. } => "exponential",
        }
    }
}

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded retry policy for connection establishment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectPolicy {
    /// Total number of attempts (not retries); at least 1
    pub max_attempts: usize,
    /// Delay between attempts; never applied after the last one
    pub backoff: Backoff,
}

impl Default for ConnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: crate::defaults::DEFAULT_CONNECT_ATTEMPTS,
            backoff: Backoff::Fixed(crate::defaults::DEFAULT_CONNECT_DELAY),
        }
    }
}

impl ConnectPolicy {
    pub fn new(max_attempts: usize, backoff: Backoff) -> Self {
        Self { max_attempts, backoff }
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// `op` receives the 1-based attempt number. When every attempt fails the
    /// last error is surfaced as [`AppError::Connect`].
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, AppError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = std::io::Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < attempts {
                        sleeper.sleep(self.backoff.delay(attempt)).await;
                    }
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        Err(AppError::connect(format!(
            "{} attempt(s) failed, last error: {}",
            attempts, last
        )))
    }
}
