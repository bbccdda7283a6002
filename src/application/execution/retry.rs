//! Bounded retry policy for venue calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Attempts, backoff and overall deadline for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first one included. At least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Random extra delay as a fraction of the base delay, in `[0, 1]`.
    pub jitter: f64,
    /// Budget for all attempts and delays together.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            jitter: 0.2,
            deadline: Duration::from_secs(30),
        }
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// A non-transient failure; not retried.
    Fatal { attempts: u32, error: E },
    /// Every attempt failed transiently.
    Exhausted { attempts: u32, last: E },
    /// The overall deadline passed first.
    DeadlineExceeded { last: Option<E> },
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based), before jitter.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = 1u32 << exponent;
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter <= 0.0 || base.is_zero() {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0.0..=jitter);
        base.mul_f64(1.0 + extra).min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails fatally, runs out of attempts or
    /// the deadline passes. `is_transient` decides which failures retry.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, is_transient: C) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut last: Option<E> = None;

        let attempts = async {
            let mut attempt = 0;
            loop {
                attempt += 1;
                match op(attempt).await {
                    Ok(value) => return Ok(value),
                    Err(error) if !is_transient(&error) => {
                        return Err(RetryError::Fatal {
                            attempts: attempt,
                            error,
                        });
                    }
                    Err(error) if attempt >= max_attempts => {
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last: error,
                        });
                    }
                    Err(error) => {
                        let delay = self.delay(attempt);
                        warn!(
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Transient failure, retrying"
                        );
                        last = Some(error);
                        sleep(delay).await;
                    }
                }
            }
        };

        let outcome = timeout(self.deadline, attempts).await;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(RetryError::DeadlineExceeded { last }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            jitter: 0.0,
            deadline: Duration::from_secs(5),
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(1),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.base_delay(1), Duration::from_millis(500));
        assert_eq!(policy.base_delay(2), Duration::from_secs(1));
        assert_eq!(policy.base_delay(10), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, RetryError<String>> = fast()
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt < 3 {
                            Err("timeout".to_string())
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                |_| true,
            )
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), RetryError<String>> = fast()
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("bad tick".to_string()) }
                },
                |_| false,
            )
            .await;
        assert!(matches!(result, Err(RetryError::Fatal { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error() {
        let result: Result<(), RetryError<String>> = fast()
            .run(|attempt| async move { Err(format!("fail {attempt}")) }, |_| true)
            .await;
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last: "fail 3".to_string()
            })
        );
    }

    #[tokio::test]
    async fn deadline_bounds_slow_attempts() {
        let policy = RetryPolicy {
            deadline: Duration::from_millis(20),
            ..fast()
        };
        let result: Result<(), RetryError<String>> = policy
            .run(
                |_| async {
                    sleep(Duration::from_secs(5)).await;
                    Ok(())
                },
                |_| true,
            )
            .await;
        assert!(matches!(result, Err(RetryError::DeadlineExceeded { .. })));
    }
}
