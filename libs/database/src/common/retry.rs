use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy for connection attempts.
///
/// Delays grow geometrically from `base_delay` up to `max_delay`; jitter
/// spreads simultaneous reconnects (half to full of the computed delay).
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Ceiling for the grown delay
    pub max_delay: Duration,
    /// Growth factor between attempts
    pub factor: f64,
    /// Randomize each delay
    pub jitter: bool,
}

impl BackoffPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delay to sleep before retry number `attempt` (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let grown = self.base_delay.as_millis() as f64 * self.factor.powi(attempt as i32 - 1);
        let capped = Duration::from_millis(grown as u64).min(self.max_delay);
        if self.jitter {
            let millis = capped.as_millis() as u64;
            Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis.max(1)))
        } else {
            capped
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            factor: 2.0,
            jitter: true,
        }
    }
}

/// Run `operation` until it succeeds or the policy is exhausted.
///
/// # Example
/// ```ignore
/// use database::common::{retry_with_backoff, BackoffPolicy};
///
/// let policy = BackoffPolicy::new().with_max_retries(5);
/// let client = retry_with_backoff(|| connect(&mongo_url), policy).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: BackoffPolicy,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(retries = attempt, "Operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(e) => {
                attempt += 1;
                if attempt > policy.max_retries {
                    warn!(attempts = attempt, "Operation failed permanently: {e}");
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                debug!(
                    attempt,
                    max = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying: {e}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retry with the default policy (3 retries, 100ms base, jittered).
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, BackoffPolicy::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy::new()
            .with_base_delay(Duration::from_millis(1))
            .without_jitter()
    }

    #[tokio::test]
    async fn first_success_needs_no_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = retry(|| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_with_backoff(
            || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("not yet".to_string())
                    } else {
                        Ok("up")
                    }
                }
            },
            fast_policy(),
        )
        .await;

        assert_eq!(result.unwrap(), "up");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_policy_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = retry_with_backoff(
            || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("down")
                }
            },
            fast_policy().with_max_retries(2),
        )
        .await;

        assert_eq!(result.unwrap_err(), "down");
        // one initial attempt plus two retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delays_grow_and_cap() {
        let policy = BackoffPolicy::new()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .without_jitter();

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(10), Duration::from_millis(300));
    }

    #[test]
    fn jittered_delay_stays_within_half_to_full() {
        let policy = BackoffPolicy::new().with_base_delay(Duration::from_millis(1000));
        for _ in 0..20 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }
}
