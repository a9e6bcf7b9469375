//! Bounded exponential-backoff retry.
//!
//! The engine knows nothing about caching: it runs an operation, waits, doubles the delay,
//! and tries again until the attempt budget is spent.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempts made when the caller does not say.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Wait before the second attempt when the caller does not say.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

const BACKOFF_FACTOR: u32 = 2;

/// Retry budget and backoff schedule.
///
/// The delay before attempt `i` (0-based, `i >= 1`) is `initial_delay * 2^(i-1)`. There
/// is no jitter. `max_delay` caps individual waits and is off unless set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: None,
        }
    }
}

/// Bookkeeping for one attempt of a retrying call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 0-based attempt number.
    pub index: u32,
    /// Wait that preceded this attempt.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            initial_delay,
            max_delay: None,
        }
    }

    /// Cap every individual wait at `max_delay`.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Attempt budget; zero is treated as a single attempt.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Waits between attempts, in order: `attempts() - 1` values.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.attempts()).map(move |i| self.delay_before(i))
    }

    /// Wait preceding attempt `index` (0-based). Zero for the first attempt.
    pub fn delay_before(&self, index: u32) -> Duration {
        if index == 0 {
            return Duration::ZERO;
        }

        let factor = BACKOFF_FACTOR.checked_pow(index - 1).unwrap_or(u32::MAX);
        let delay = self.initial_delay.saturating_mul(factor);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Run `operation` until it succeeds or the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt unchanged. Earlier errors are only logged.
    pub async fn run<T, E, F, Fut>(self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.attempts();
        let mut attempt = RetryAttempt {
            index: 0,
            delay: Duration::ZERO,
        };

        loop {
            if !attempt.delay.is_zero() {
                tokio::time::sleep(attempt.delay).await;
            }

            match operation().await {
                Ok(value) => {
                    if attempt.index > 0 {
                        debug!(
                            "✓ Operation succeeded on attempt {}/{}",
                            attempt.index + 1,
                            max_attempts
                        );
                    }
                    return Ok(value);
                }
                Err(e) => {
                    let next = attempt.index + 1;
                    if next >= max_attempts {
                        error!(
                            "✗ Operation failed after {} attempt(s): {}",
                            max_attempts, e
                        );
                        return Err(e);
                    }

                    let delay = self.delay_before(next);
                    warn!(
                        "Operation failed (attempt {}/{}), retrying in {:?}: {}",
                        next, max_attempts, delay, e
                    );
                    attempt = RetryAttempt { index: next, delay };
                }
            }
        }
    }
}

/// Retry `operation` up to `max_attempts` times, starting with `initial_delay` and doubling.
///
/// ```ignore
/// let news = retry(|| fetch_news(&client), 3, Duration::from_millis(1000)).await?;
/// ```
pub async fn retry<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryPolicy::new(max_attempts, initial_delay)
        .run(operation)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.max_delay, None);
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
        assert_eq!(policy.delay_before(0), Duration::ZERO);
    }

    #[test]
    fn test_delay_cap() {
        let policy =
            RetryPolicy::new(6, Duration::from_millis(100)).with_max_delay(Duration::from_millis(250));
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(delays[1], Duration::from_millis(200));
        assert_eq!(delays[2], Duration::from_millis(250));
        assert_eq!(delays[4], Duration::from_millis(250));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.attempts(), 1);
        assert_eq!(policy.delays().count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let counter = calls.clone();
        let result: Result<&str, String> = retry(
            move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(format!("fail {}", n))
                    } else {
                        Ok("done")
                    }
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300));
        assert!(waited < Duration::from_millis(310));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        let result: Result<(), String> = retry(
            move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure #{}", n))
                }
            },
            4,
            Duration::from_millis(10),
        )
        .await;

        assert_eq!(result, Err("failure #3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_wait() {
        let start = Instant::now();
        let result: Result<u8, String> =
            retry(|| async { Ok(7) }, 3, Duration::from_secs(60)).await;

        assert_eq!(result, Ok(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_sleeps() {
        let start = Instant::now();
        let result: Result<(), &str> =
            retry(|| async { Err("nope") }, 1, Duration::from_secs(5)).await;

        assert_eq!(result, Err("nope"));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    proptest! {
        #[test]
        fn prop_delay_doubles(initial_ms in 0u64..10_000, index in 1u32..12) {
            let policy = RetryPolicy::new(20, Duration::from_millis(initial_ms));
            let expected = Duration::from_millis(initial_ms * 2u64.pow(index - 1));
            prop_assert_eq!(policy.delay_before(index), expected);
        }

        #[test]
        fn prop_total_wait(initial_ms in 0u64..1_000, attempts in 1u32..10) {
            let policy = RetryPolicy::new(attempts, Duration::from_millis(initial_ms));
            let total: Duration = policy.delays().sum();
            let expected = initial_ms * (2u64.pow(attempts - 1) - 1);
            prop_assert_eq!(total, Duration::from_millis(expected));
        }
    }
}
