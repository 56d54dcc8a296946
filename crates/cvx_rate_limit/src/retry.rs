//! Retry with exponential backoff and jitter.
//!
//! The executor runs a fallible async operation and retries it while the
//! failure reports itself as transient through [`RetryableError`]. Permanent
//! failures return on the first attempt. The backoff schedule is produced by
//! [`Backoff`], an iterator of delays fed to `tokio-retry2`.

use cvx_error::{CancelledError, ConfigError, RetryableError};
use derive_getters::Getters;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry policy for AI API calls.
///
/// Immutable once built; share it freely between calls.
///
/// # Example
///
/// ```
/// use cvx_rate_limit::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default();
/// assert_eq!(*config.max_retries(), 3);
/// assert_eq!(*config.base_delay(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Getters)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    max_retries: usize,
    /// Delay before the first retry
    base_delay: Duration,
    /// Upper bound on the nominal delay
    max_delay: Duration,
    /// Growth factor per attempt
    multiplier: f64,
    /// Fraction of the delay randomly added or removed
    jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter_ratio: 0.1,
        }
    }
}

impl RetryConfig {
    /// Build a validated retry policy.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` unless `multiplier > 1`, `0 <= jitter_ratio < 1`
    /// and `max_delay >= base_delay`.
    pub fn new(
        max_retries: usize,
        base_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
        jitter_ratio: f64,
    ) -> Result<Self, ConfigError> {
        if !(multiplier.is_finite() && multiplier > 1.0) {
            return Err(ConfigError::new(format!(
                "retry multiplier must be greater than 1, got {}",
                multiplier
            )));
        }
        if !(0.0..1.0).contains(&jitter_ratio) {
            return Err(ConfigError::new(format!(
                "retry jitter ratio must be in [0, 1), got {}",
                jitter_ratio
            )));
        }
        if max_delay < base_delay {
            return Err(ConfigError::new(format!(
                "retry max delay {:?} is shorter than base delay {:?}",
                max_delay, base_delay
            )));
        }

        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
            multiplier,
            jitter_ratio,
        })
    }

    /// Delay before retry number `attempt + 1`, without jitter.
    ///
    /// `attempt` counts the attempts already made minus one, so attempt 0 is
    /// the wait after the first failure. The result is
    /// `min(base_delay * multiplier^attempt, max_delay)`.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_delay.as_nanos() as f64);
        Duration::from_nanos(capped as u64)
    }

    /// Delay before retry number `attempt + 1`, with jitter applied.
    ///
    /// Jitter moves the nominal delay by up to `jitter_ratio` of itself in
    /// either direction.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.nominal_delay(attempt);
        if self.jitter_ratio <= 0.0 {
            return delay;
        }

        let spread: f64 = rand::thread_rng().gen_range(-1.0..1.0);
        let nanos = delay.as_nanos() as f64;
        Duration::from_nanos((nanos + nanos * self.jitter_ratio * spread).max(0.0) as u64)
    }

    /// The delay schedule for one call.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            config: *self,
            attempt: 0,
        }
    }
}

/// Iterator over the waits between attempts.
///
/// Yields `max_retries` delays and then stops, which ends the retry loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempt as usize >= self.config.max_retries {
            debug!(max_retries = self.config.max_retries, "Retries exhausted");
            return None;
        }

        let delay = self.config.delay_for(self.attempt);
        self.attempt += 1;
        debug!(
            attempt = self.attempt,
            max_retries = self.config.max_retries,
            ?delay,
            "Retrying after transient error"
        );
        Some(delay)
    }
}

/// True if `err` is tagged as transient.
pub fn is_retryable<E: RetryableError>(err: &E) -> bool {
    err.is_retryable()
}

/// Run `operation`, retrying transient failures with exponential backoff.
///
/// - Success returns the value at once.
/// - A failure whose `is_retryable()` is false returns at once.
/// - A transient failure waits for the next backoff delay and tries again;
///   after `max_retries` retries the last error is returned as is.
/// - If `cancel` fires, the wait (or in-flight attempt) is abandoned and a
///   cancellation error is returned instead of the last operation error.
///
/// At most `max_retries + 1` attempts are made.
///
/// # Example
///
/// ```no_run
/// use cvx_error::{ProviderError, ProviderErrorKind};
/// use cvx_rate_limit::{retry, RetryConfig};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let result: Result<String, ProviderError> = retry(&cancel, &RetryConfig::default(), || async {
///     Err(ProviderError::new(ProviderErrorKind::Overloaded("529".into())))
/// })
/// .await;
/// assert!(result.is_err());
/// # }
/// ```
pub async fn retry<T, E, F, Fut>(
    cancel: &CancellationToken,
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + From<CancelledError> + Display,
{
    let mut attempt = 0usize;
    let action = || {
        attempt += 1;
        let current = attempt;
        let call = operation();
        async move {
            match call.await {
                Ok(value) => Ok(value),
                Err(err) if err.is_retryable() => {
                    debug!(attempt = current, error = %err, "Transient error");
                    Err(RetryError::Transient {
                        err,
                        retry_after: None,
                    })
                }
                Err(err) => {
                    warn!(attempt = current, error = %err, "Permanent error, failing immediately");
                    Err(RetryError::Permanent(err))
                }
            }
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Retry cancelled");
            Err(E::from(CancelledError::new("retry backoff")))
        }
        result = Retry::spawn(config.backoff(), action) => result,
    }
}
