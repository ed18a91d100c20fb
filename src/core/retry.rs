//! Bounded retry with exponential backoff and jitter.

use std::time::Duration;

use rand::Rng;

use crate::prelude::*;

#[derive(Copy, Clone, Debug)]
pub struct Backoff {
    pub initial_delay: Duration,
    pub factor: u32,
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self { initial_delay: Duration::from_secs(1), factor: 2, max_attempts: 5 }
    }
}

impl Backoff {
    /// Delay before the given retry (zero-based), with up to 50 % uniform
    /// jitter to avoid thundering retries against the same endpoint.
    fn delay(self, retry: u32) -> Duration {
        let base = self.initial_delay * self.factor.saturating_pow(retry);
        base + base.mul_f64(rand::rng().random_range(0.0..0.5))
    }
}

/// Run the fallible operation until it succeeds or the attempts are exhausted,
/// in which case the last error surfaces. The operation itself decides what is
/// transient: anything it returns as `Err` is retried.
pub async fn retry<T, F, Fut>(backoff: Backoff, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt + 1 >= backoff.max_attempts => {
                error!(attempt, %error, "giving up");
                return Err(error);
            }
            Err(error) => {
                let delay = backoff.delay(attempt);
                warn!(attempt, %error, ?delay, "retrying…");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
