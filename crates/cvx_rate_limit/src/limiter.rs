//! Token-bucket rate limiter for outbound API calls.
//!
//! Capacity accumulates continuously at `refill_rate` tokens per second up to
//! `max_tokens`, and every permitted call consumes one token. A fresh limiter
//! starts full, so the first burst of `max_tokens` calls goes through without
//! waiting.

use crate::RetryConfig;
use cvx_error::{CancelledError, ConfigError, RetryableError};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};

/// Mutable bucket state, guarded by the limiter's mutex.
#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    /// Credit the tokens earned since the last accounting, capped at `max_tokens`.
    fn refill(&mut self, now: Instant, refill_rate: f64, max_tokens: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * refill_rate).min(max_tokens);
        self.last_refill = now;
    }
}

/// Token-bucket rate limiter.
///
/// Each AI client owns one limiter. Callers may share it across tasks: the
/// refill-then-consume step runs under a mutex, so a token is never handed
/// to two callers. Waiters are not served in FIFO order.
///
/// # Example
///
/// ```no_run
/// use cvx_rate_limit::RateLimiter;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = RateLimiter::new(2.0)?; // 2 requests per second, bursts of 2
/// let cancel = CancellationToken::new();
///
/// limiter.wait(&cancel).await?;
/// // ... make API call ...
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    max_tokens: f64,
    refill_rate: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter admitting `rate_per_second` calls per second.
    ///
    /// The bucket holds `rate_per_second` tokens and starts full. Rates below
    /// one still get a capacity of one token, otherwise no call could ever be
    /// admitted.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the rate is zero, negative, or not finite.
    pub fn new(rate_per_second: f64) -> Result<Self, ConfigError> {
        if !rate_per_second.is_finite() || rate_per_second <= 0.0 {
            return Err(ConfigError::new(format!(
                "rate limit must be a positive number of requests per second, got {}",
                rate_per_second
            )));
        }

        let max_tokens = rate_per_second.max(1.0);
        debug!(rate_per_second, max_tokens, "Creating RateLimiter");

        Ok(Self {
            max_tokens,
            refill_rate: rate_per_second,
            bucket: Mutex::new(Bucket {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        })
    }

    /// Steady-state rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.refill_rate
    }

    /// Bucket capacity.
    pub fn capacity(&self) -> f64 {
        self.max_tokens
    }

    /// Tokens available right now, after crediting elapsed time.
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now(), self.refill_rate, self.max_tokens);
        bucket.tokens
    }

    /// Wait until a token is available, then consume it.
    ///
    /// Returns immediately when the bucket holds at least one token.
    /// Otherwise sleeps for the time needed to accrue one token and tries
    /// again, since a concurrent caller may have taken it in the meantime.
    ///
    /// # Errors
    ///
    /// Returns `CancelledError` if `cancel` fires before a token is obtained.
    /// Nothing is consumed in that case.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), CancelledError> {
        loop {
            let shortfall = {
                let mut bucket = self.bucket.lock().await;
                bucket.refill(Instant::now(), self.refill_rate, self.max_tokens);

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    trace!(remaining = bucket.tokens, "Rate limit token granted");
                    return Ok(());
                }

                1.0 - bucket.tokens
            };

            let wait = Duration::try_from_secs_f64(shortfall / self.refill_rate)
                .unwrap_or(Duration::MAX);
            debug!(?wait, "Rate limit reached, waiting for refill");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Rate limit wait cancelled");
                    return Err(CancelledError::new("rate limiter wait"));
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Wait for a token once, then run `operation` through the retry executor.
    ///
    /// Rate limiting applies to the call as a whole; retries triggered by
    /// transient failures do not consume further tokens.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let text = limiter
    ///     .execute(&cancel, &RetryConfig::default(), || backend.send(None, prompt))
    ///     .await?;
    /// ```
    #[instrument(skip_all, fields(rate = self.refill_rate))]
    pub async fn execute<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        config: &RetryConfig,
        operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + From<CancelledError> + Display,
    {
        self.wait(cancel).await.map_err(E::from)?;
        crate::retry(cancel, config, operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_rates() {
        assert!(RateLimiter::new(0.0).is_err());
        assert!(RateLimiter::new(-1.0).is_err());
        assert!(RateLimiter::new(f64::NAN).is_err());
        assert!(RateLimiter::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_bucket_refill_is_capped() {
        let start = Instant::now();
        let mut bucket = Bucket {
            tokens: 0.0,
            last_refill: start,
        };

        bucket.refill(start + Duration::from_secs(3600), 5.0, 5.0);
        assert_eq!(bucket.tokens, 5.0);

        bucket.tokens = 0.5;
        bucket.refill(start + Duration::from_secs(3600) + Duration::from_millis(100), 5.0, 5.0);
        assert!((bucket.tokens - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sub_unit_rate_gets_unit_capacity() {
        let limiter = RateLimiter::new(0.5).unwrap();
        assert_eq!(limiter.capacity(), 1.0);
        assert_eq!(limiter.rate(), 0.5);
    }
}
