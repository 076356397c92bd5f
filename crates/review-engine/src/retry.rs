//! Optional re-invocation when the provider rejects an answer for recitation.
//!
//! The primary analysis path calls the model once. This hook is for
//! deployments that prefer paying for another call over failing outright.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first call.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the `failures`-th failed attempt: `base_delay * 2^failures`.
    pub fn delay_after(&self, failures: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(failures))
    }
}

/// Run `call` until it succeeds, fails for another reason, or attempts run out.
pub async fn retry_on_recitation<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, ModelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ModelError>>,
{
    let mut failures = 0;
    loop {
        match call().await {
            Err(e) if e.is_recitation() && failures + 1 < policy.max_attempts => {
                failures += 1;
                let delay = policy.delay_after(failures);
                warn!(attempt = failures, delay_ms = delay.as_millis() as u64, "Recitation rejection, retrying");
                tokio::time::sleep(delay).await;
            }
            other => return other,
        }
    }
}
