//! Rate limiting and retry for AI provider calls.
//!
//! This crate bounds how fast cvx talks to AI APIs and recovers from
//! transient failures:
//!
//! - [`RateLimiter`] - token bucket with cancellable waits
//! - [`retry`] - exponential backoff with jitter, driven by the
//!   [`RetryableError`](cvx_error::RetryableError) tag on each failure
//! - [`CvxConfig`] - TOML configuration for retry policy, provider rates,
//!   cache location and default agent
//!
//! A typical call waits on the provider's limiter once and then runs the
//! request through the retry executor:
//!
//! ```no_run
//! use cvx_error::ProviderError;
//! use cvx_rate_limit::{RateLimiter, RetryConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn send() -> Result<String, ProviderError> { Ok(String::new()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let limiter = RateLimiter::new(1.0)?;
//! let cancel = CancellationToken::new();
//! let text = limiter
//!     .execute(&cancel, &RetryConfig::default(), || send())
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod limiter;
mod retry;

pub use config::{
    AgentSettings, CacheSettings, CvxConfig, DEFAULT_REQUESTS_PER_SECOND, ProviderSettings,
    RetrySettings,
};
pub use limiter::RateLimiter;
pub use retry::{Backoff, RetryConfig, is_retryable, retry};
