//! Retry utility for transient remote failures
//!
//! Only errors the caller classifies as retryable are retried; anything else is
//! returned on the first attempt.

use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for remote calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `1` disables retrying.
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Execute an async operation, retrying errors accepted by `is_retryable`
///
/// # Examples
/// ```rust
/// use streamtick::core::retry::{retry_async, RetryPolicy};
///
/// # async fn example() -> Result<String, String> {
/// let result = retry_async(
///     "get_messages",
///     &RetryPolicy::default(),
///     |e: &String| e.contains("429"),
///     || async { Ok::<String, String>("batch".to_string()) },
/// )
/// .await?;
/// # Ok(result)
/// # }
/// ```
pub async fn retry_async<F, T, E, Fut, P>(
    operation_name: &str,
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => {
                if attempt >= max_attempts || !is_retryable(&error) {
                    return Err(error);
                }
                log::warn!(
                    "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                    operation_name,
                    attempt,
                    max_attempts,
                    policy.delay,
                    error
                );
                sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn always(_: &&str) -> bool {
        true
    }

    #[tokio::test]
    async fn test_retry_succeeds_immediately() {
        let result = retry_async("test_operation", &RetryPolicy::default(), always, || async {
            Ok::<i32, &str>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_failures() {
        let attempt_count = Arc::new(Mutex::new(0));

        let result = retry_async("test_operation", &RetryPolicy::default(), always, || {
            let count = attempt_count.clone();
            async move {
                let mut attempts = count.lock().unwrap();
                *attempts += 1;
                if *attempts < 3 {
                    Err("temporary failure")
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(*attempt_count.lock().unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_attempts() {
        let attempt_count = Arc::new(Mutex::new(0));
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(10),
        };

        let result = retry_async("test_operation", &policy, always, || {
            let count = attempt_count.clone();
            async move {
                *count.lock().unwrap() += 1;
                Err::<i32, &str>("persistent failure")
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "persistent failure");
        assert_eq!(*attempt_count.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let attempt_count = Arc::new(Mutex::new(0));

        let result = retry_async(
            "test_operation",
            &RetryPolicy::default(),
            |e: &&str| *e != "unauthorized",
            || {
                let count = attempt_count.clone();
                async move {
                    *count.lock().unwrap() += 1;
                    Err::<i32, &str>("unauthorized")
                }
            },
        )
        .await;

        assert_eq!(result.unwrap_err(), "unauthorized");
        assert_eq!(*attempt_count.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let attempt_count = Arc::new(Mutex::new(0));

        let result = retry_async("test_operation", &RetryPolicy::no_retry(), always, || {
            let count = attempt_count.clone();
            async move {
                *count.lock().unwrap() += 1;
                Err::<i32, &str>("rate limited")
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*attempt_count.lock().unwrap(), 1);
    }
}
