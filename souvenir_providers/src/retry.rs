use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delays between attempts of a fallible remote call.
///
/// One attempt is made up front and one more after each delay, so a policy
/// with `n` delays tries at most `n + 1` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Single attempt.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(Vec::new())
    }

    /// Exponential backoff: `base`, `2 * base`, `4 * base`, ... `retries` times.
    #[must_use]
    pub fn exponential(base: Duration, retries: u32) -> Self {
        Self::new((0..retries).map(|i| base * 2u32.saturating_pow(i)).collect())
    }

    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.delays.len() + 1
    }

    /// Run `operation` until it succeeds or the policy is exhausted; the
    /// last error is returned.
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Display,
    {
        let total = self.max_attempts();
        let mut attempt = 1;

        for delay in &self.delays {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(
                        "Request failed (attempt {attempt}/{total}): {e}. Retrying after {}ms...",
                        delay.as_millis()
                    );
                    sleep(*delay).await;
                }
            }
            attempt += 1;
        }

        operation().await
    }
}

impl Default for RetryPolicy {
    /// 1s, 2s, 4s.
    fn default() -> Self {
        Self::exponential(Duration::from_secs(1), 3)
    }
}
