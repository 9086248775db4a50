use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Delays between attempts of a retried request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Backoff delays, one retry per entry
    pub base_delays: Vec<Duration>,
    /// Additional retries once the base delays are used up
    pub final_retries: usize,
    /// Delay before each of the final retries
    pub final_delay: Duration,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            base_delays: Vec::new(),
            final_retries: 0,
            final_delay: Duration::ZERO,
        }
    }

    /// Total number of attempts including the first one.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        1 + self.base_delays.len() + self.final_retries
    }

    fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        self.base_delays
            .iter()
            .copied()
            .chain(std::iter::repeat_n(self.final_delay, self.final_retries))
    }
}

/// Retry an async operation with backoff.
///
/// Errors for which `retryable` returns `false` are returned at once.
///
/// # Returns
/// The first successful result, or the error of the last attempt
pub async fn retry_with_backoff<F, Fut, T, E, R>(
    mut operation: F,
    policy: &RetryPolicy,
    retryable: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
    R: Fn(&E) -> bool,
{
    let total = policy.max_attempts();
    let mut attempt = 1;
    let mut result = operation().await;

    for delay in policy.delays() {
        let Err(e) = &result else {
            break;
        };
        if !retryable(e) {
            warn!("Request failed (attempt {attempt}/{total}): {e}. Not retrying");
            break;
        }
        warn!(
            "Request failed (attempt {attempt}/{total}): {e}. Retrying after {}ms...",
            delay.as_millis()
        );
        sleep(delay).await;
        attempt += 1;
        result = operation().await;
    }

    result
}
