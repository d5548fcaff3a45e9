//! Bounded-backoff retry for source-chain RPC calls.
//!
//! Retries only transient transport failures; decode errors and other
//! deterministic failures are returned immediately. The relay is
//! liveness-critical and single-instance, so RPC hiccups get a few doubling
//! delays before the tick is abandoned and re-run from the same block.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::Result;

/// Bounded exponential backoff policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry attempts after the initial call.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Run `f`, retrying retryable failures with doubling delays, then one
    /// final attempt without retry.
    pub async fn run<T, F, Fut>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for attempt in 0..self.max_retries {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        "rpc call failed, retrying in {delay:?}: {e}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
        f().await
    }
}
